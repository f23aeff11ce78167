use crate::models::{GeocodedLocation, Location};
use serde_json::{Map, Value};

/// The `address` object of a reverse-geocoding response
pub type AddressMap = Map<String, Value>;

pub const CITY_KEYS: (&str, &[&str]) = ("city", &["town", "village"]);
pub const STATE_KEYS: (&str, &[&str]) = ("state", &["county"]);
pub const COUNTRY_KEYS: (&str, &[&str]) = ("country", &[]);
pub const SUBURB_KEYS: (&str, &[&str]) = ("suburb", &["municipality"]);

/// First non-blank string found under `primary_key` or, in order, the fallbacks
///
/// Missing keys, blank strings and non-string values are all skipped. Returns
/// an empty string when nothing usable is present.
pub fn extract_address_field(raw: &AddressMap, primary_key: &str, fallback_keys: &[&str]) -> String {
    std::iter::once(primary_key)
        .chain(fallback_keys.iter().copied())
        .find_map(|key| {
            raw.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_default()
}

/// Build the resolved record for a location from its address object
pub fn geocoded_from_address(location: Location, address: &AddressMap) -> GeocodedLocation {
    let field = |(primary, fallbacks): (&str, &[&str])| {
        extract_address_field(address, primary, fallbacks)
    };

    GeocodedLocation::new(
        location,
        field(CITY_KEYS),
        field(STATE_KEYS),
        field(COUNTRY_KEYS),
        field(SUBURB_KEYS),
    )
}
