use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    COORDINATE_SCALE, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE,
};

/// Convert decimal degrees to an integer count of thousandths of a degree
///
/// Halfway values round away from zero.
///
/// # Examples
/// ```
/// use geoweather_processor::utils::coordinates::to_milli_degrees;
///
/// assert_eq!(to_milli_degrees(25.3334), 25333);
/// assert_eq!(to_milli_degrees(-3.0), -3000);
/// ```
pub fn to_milli_degrees(degrees: f64) -> i32 {
    (degrees * COORDINATE_SCALE).round() as i32
}

/// Convert thousandths of a degree back to decimal degrees
pub fn from_milli_degrees(milli: i32) -> f64 {
    milli as f64 / COORDINATE_SCALE
}

/// Round decimal degrees to the location grid (3 decimal places)
pub fn round_coordinate(degrees: f64) -> f64 {
    from_milli_degrees(to_milli_degrees(degrees))
}

/// Round a value to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn is_valid_latitude(latitude: f64) -> bool {
    (MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude)
}

pub fn is_valid_longitude(longitude: f64) -> bool {
    (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude)
}

/// Parse a coordinate pair read from a checkpoint or side file
pub fn parse_coordinate_pair(lat: &str, long: &str) -> Result<(f64, f64)> {
    let latitude = lat.trim().parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid latitude value: '{}'", lat))
    })?;
    let longitude = long.trim().parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid longitude value: '{}'", long))
    })?;

    if !is_valid_latitude(latitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Latitude {} is outside [{}, {}]",
            latitude, MIN_LATITUDE, MAX_LATITUDE
        )));
    }

    if !is_valid_longitude(longitude) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Longitude {} is outside [{}, {}]",
            longitude, MIN_LONGITUDE, MAX_LONGITUDE
        )));
    }

    Ok((latitude, longitude))
}
