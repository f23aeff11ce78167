use crate::config::GeocoderSettings;
use crate::error::{ProcessingError, Result};
use crate::geocoding::{AddressMap, ReverseGeocoder};
use crate::models::Location;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Body of a `/reverse?format=jsonv2` response
///
/// A coordinate with no match yields `{"error": "Unable to geocode"}`.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<AddressMap>,
    #[serde(default)]
    error: Option<String>,
}

/// Reverse geocoding against an OpenStreetMap Nominatim endpoint
pub struct NominatimClient {
    client: Client,
    base_url: String,
    language: String,
}

impl NominatimClient {
    pub fn new(settings: &GeocoderSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
        })
    }

    fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, location: &Location) -> Result<Option<AddressMap>> {
        let lat = location.latitude().to_string();
        let lon = location.longitude().to_string();

        let response = self
            .client
            .get(self.reverse_url())
            .query(&[
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("accept-language", self.language.as_str()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProcessingError::Geocoding(format!(
                "rate limited by {}",
                self.base_url
            )));
        }
        let response = response.error_for_status()?;

        let body: ReverseResponse = response.json().await?;

        if let Some(message) = body.error {
            debug!("No reverse geocoding match for {}: {}", location, message);
            return Ok(None);
        }

        match body.address {
            Some(address) => Ok(Some(address)),
            None => Err(ProcessingError::InvalidFormat(format!(
                "reverse response for {} has neither address nor error",
                location
            ))),
        }
    }
}
