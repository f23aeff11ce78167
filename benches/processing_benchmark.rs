use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geoweather_processor::models::{GeocodedLocation, Location, MetricType, WeatherObservation};
use geoweather_processor::processors::{
    DataMerger, DataPivoter, IntegrityChecker, LocationExtractor,
};
use geoweather_processor::utils::round_coordinate;

// Three readings per station per day, stations spread on a 0.01° grid
fn create_test_observations(station_count: usize, days: usize) -> Vec<WeatherObservation> {
    let base_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut observations = Vec::with_capacity(station_count * days * 3);

    for station in 0..station_count {
        let latitude = 20.0 + station as f64 * 0.01;
        let longitude = 50.0 + station as f64 * 0.01;

        for day in 0..days {
            let date = base_date + chrono::Duration::days(day as i64);
            let base = 200.0 + day as f64 + station as f64;

            for (metric, value) in [
                (MetricType::Tmax, base + 50.0),
                (MetricType::Tmin, base - 50.0),
                (MetricType::Prcp, (day % 7) as f64 * 3.0),
            ] {
                observations.push(WeatherObservation {
                    station_id: format!("ST{:06}", station),
                    station_name: format!("Test Station {}", station),
                    date,
                    metric,
                    latitude,
                    longitude,
                    value: Some(value),
                });
            }
        }
    }

    observations
}

fn create_geocoded(observations: &[WeatherObservation]) -> Vec<GeocodedLocation> {
    LocationExtractor::new()
        .extract(observations)
        .locations
        .into_iter()
        .map(|location| {
            GeocodedLocation::new(
                location,
                format!("City {}", location),
                "State".to_string(),
                "Country".to_string(),
                String::new(),
            )
        })
        .collect()
}

fn benchmark_location_extraction(c: &mut Criterion) {
    let observations = create_test_observations(200, 30);

    c.bench_function("location_extraction", |b| {
        b.iter(|| {
            let set = LocationExtractor::new().extract(black_box(&observations));
            black_box(set.len())
        })
    });
}

fn benchmark_data_merger(c: &mut Criterion) {
    let observations = create_test_observations(100, 30);
    let geocoded = create_geocoded(&observations);

    c.bench_function("data_merger", |b| {
        b.iter(|| {
            let report = DataMerger::new()
                .merge(observations.clone(), black_box(&geocoded))
                .unwrap();
            black_box(report.enriched.len())
        })
    });
}

fn benchmark_data_pivoter(c: &mut Criterion) {
    let observations = create_test_observations(100, 30);
    let geocoded = create_geocoded(&observations);
    let merged = DataMerger::new().merge(observations, &geocoded).unwrap();

    c.bench_function("data_pivoter", |b| {
        b.iter(|| {
            let report = DataPivoter::new().pivot(black_box(&merged.enriched));
            black_box(report.records.len())
        })
    });
}

fn benchmark_integrity_checker(c: &mut Criterion) {
    let observations = create_test_observations(50, 60);
    let geocoded = create_geocoded(&observations);
    let merged = DataMerger::new().merge(observations, &geocoded).unwrap();
    let records = DataPivoter::new().pivot(&merged.enriched).records;

    c.bench_function("integrity_checker", |b| {
        b.iter(|| {
            let report = IntegrityChecker::new().check_integrity(black_box(&records));
            black_box(report.total_records)
        })
    });
}

fn benchmark_coordinate_rounding(c: &mut Criterion) {
    let coordinates = vec![25.3334, -33.8675, 51.5074, -0.1278, 139.6917, 0.0005];

    c.bench_function("coordinate_rounding", |b| {
        b.iter(|| {
            let keys: Vec<Location> = coordinates
                .windows(2)
                .map(|pair| Location::from_degrees(pair[0], pair[1]))
                .collect();
            let rounded: f64 = coordinates.iter().map(|&c| round_coordinate(c)).sum();
            black_box((keys.len(), rounded))
        })
    });
}

fn benchmark_varying_data_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_and_pivot_by_size");

    for &size in &[10, 50, 100, 500] {
        group.bench_with_input(
            BenchmarkId::new("stations", size),
            &size,
            |b, &station_count| {
                let observations = create_test_observations(station_count, 30);
                let geocoded = create_geocoded(&observations);

                b.iter(|| {
                    let merged = DataMerger::new()
                        .merge(observations.clone(), &geocoded)
                        .unwrap();
                    let pivot = DataPivoter::new().pivot(&merged.enriched);
                    black_box(pivot.records.len())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_location_extraction,
    benchmark_data_merger,
    benchmark_data_pivoter,
    benchmark_integrity_checker,
    benchmark_coordinate_rounding,
    benchmark_varying_data_sizes
);
criterion_main!(benches);
