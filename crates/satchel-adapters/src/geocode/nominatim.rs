use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use satchel_core::geo::Coordinate;
use satchel_ports::error::GeocodeError;
use satchel_ports::outbound::Geocoder;

const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

// Nominatim's usage policy rejects anonymous clients
const USER_AGENT: &str = concat!("satchel/", env!("CARGO_PKG_VERSION"));

/// Address lookup against a Nominatim server. The endpoint is
/// swappable for self-hosted instances.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        })
    }
}

/// Nominatim serializes coordinates as strings.
fn parse_place(place: &Place) -> Option<Coordinate> {
    let lat: f64 = place.lat.trim().parse().ok()?;
    let lon: f64 = place.lon.trim().parse().ok()?;
    Coordinate::new(lat, lon).ok()
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodeError::BadQuery("empty address".to_owned()));
        }
        debug!(%address, "geocoding");

        let response = self
            .client
            .get(format!("{}/search", self.endpoint))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Unavailable(format!("status {status}")));
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;
        Ok(places.first().and_then(parse_place))
    }
}
