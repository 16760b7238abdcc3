//! Google Maps Geocoding API client.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use streetcar_delay_transit_models::GeoPoint;

use crate::address::normalize_description;
use crate::service_registry::GeocodingService;
use crate::{GeocodeError, Geocoder};

/// Geocoder backed by the Google Maps Geocoding API.
#[derive(Debug, Clone)]
pub struct GoogleMapsGeocoder {
    client: reqwest::Client,
    base_url: String,
    bounds: String,
    api_key: String,
}

impl GoogleMapsGeocoder {
    /// Creates a geocoder for `service` with an explicit API key.
    #[must_use]
    pub fn new(client: reqwest::Client, service: &GeocodingService, api_key: String) -> Self {
        Self {
            client,
            base_url: service.base_url.clone(),
            bounds: service.bounds.clone(),
            api_key,
        }
    }

    /// Creates a geocoder reading the API key from the environment
    /// variable named in `service`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingApiKey`] if the variable is unset or
    /// empty.
    pub fn from_env(
        client: reqwest::Client,
        service: &GeocodingService,
    ) -> Result<Self, GeocodeError> {
        let api_key = std::env::var(&service.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GeocodeError::MissingApiKey {
                variable: service.api_key_env.clone(),
            })?;
        Ok(Self::new(client, service, api_key))
    }
}

#[async_trait::async_trait]
impl Geocoder for GoogleMapsGeocoder {
    async fn geocode(&self, description: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let address = normalize_description(description);
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("address", address.as_str()),
                ("bounds", self.bounds.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                message: format!("Google Maps returned status {}", resp.status()),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Geocoding API response body.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeoPoint>, GeocodeError> {
    match body.get("status").and_then(serde_json::Value::as_str) {
        None | Some("OK" | "ZERO_RESULTS") => {}
        Some("OVER_QUERY_LIMIT") => return Err(GeocodeError::RateLimited),
        Some(status) => {
            let detail = body
                .get("error_message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("no error message");
            return Err(GeocodeError::Status {
                message: format!("{status}: {detail}"),
            });
        }
    }

    let results = body
        .get("results")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "response missing 'results' array".to_string(),
        })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let location = first
        .pointer("/geometry/location")
        .ok_or_else(|| GeocodeError::Parse {
            message: "result missing geometry.location".to_string(),
        })?;

    let lat = location["lat"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "latitude is not a number".to_string(),
    })?;
    let lng = location["lng"].as_f64().ok_or_else(|| GeocodeError::Parse {
        message: "longitude is not a number".to_string(),
    })?;

    Ok(Some(GeoPoint::from_lat_lng(lat, lng)))
}
