use std::collections::BTreeMap;

use async_trait::async_trait;

use satchel_core::geo::Coordinate;
use satchel_ports::error::GeocodeError;
use satchel_ports::outbound::Geocoder;

/// Offline geocoder over a fixed address table. Fits demos and closed
/// service areas where the reachable addresses are known up front.
#[derive(Debug, Default, Clone)]
pub struct TableGeocoder {
    entries: BTreeMap<String, Coordinate>,
}

impl TableGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: &str, location: Coordinate) -> Self {
        self.insert(address, location);
        self
    }

    pub fn insert(&mut self, address: &str, location: Coordinate) {
        self.entries.insert(normalize(address), location);
    }
}

/// Collapses whitespace and case so "12 Main St" and " 12  main st "
/// hit the same entry.
fn normalize(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        Ok(self.entries.get(&normalize(address)).copied())
    }
}
