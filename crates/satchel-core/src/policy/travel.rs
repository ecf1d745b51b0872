use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;
use crate::geo::Coordinate;
use crate::money::Money;
use crate::policy::normalize::{number_field, number_value, round2};

/// One step of the distance-based surcharge ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    up_to_km: f64,
    price_delta: Money,
}

impl PriceTier {
    pub fn up_to_km(&self) -> f64 {
        self.up_to_km
    }

    pub fn price_delta(&self) -> Money {
        self.price_delta
    }
}

/// How far a tutor travels and what they charge for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelPolicy {
    radius_km: f64,
    zone_breaks_km: Vec<f64>,
    radius_pricing: Vec<PriceTier>,
    base_location: Option<Coordinate>,
}

impl TravelPolicy {
    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn zone_breaks_km(&self) -> &[f64] {
        &self.zone_breaks_km
    }

    pub fn radius_pricing(&self) -> &[PriceTier] {
        &self.radius_pricing
    }

    pub fn base_location(&self) -> Option<Coordinate> {
        self.base_location
    }

    /// A non-positive radius means the tutor travels anywhere.
    pub fn unrestricted(&self) -> bool {
        self.radius_km <= 0.0
    }

    /// Surcharge for a trip of `distance_km`, or an error when the trip
    /// falls outside the travel radius.
    pub fn price_for(&self, distance_km: f64) -> Result<Money, DomainError> {
        if !self.unrestricted() && distance_km > self.radius_km {
            return Err(DomainError::OutsideTravelRadius);
        }
        let Some(last) = self.radius_pricing.last() else {
            return Ok(Money::ZERO);
        };
        let tier = self
            .radius_pricing
            .iter()
            .find(|tier| distance_km <= tier.up_to_km)
            .unwrap_or(last);
        Ok(tier.price_delta)
    }

    pub(crate) fn from_value(raw: &Value, defaults: &TravelPolicy) -> TravelPolicy {
        let radius_km = number_field(raw, "travelRadiusKm")
            .map(|v| round2(v.max(0.0)))
            .unwrap_or(defaults.radius_km);
        let zone_breaks_km = raw
            .get("travelZoneBreaksKm")
            .and_then(Value::as_array)
            .map(|entries| {
                let mut zones: Vec<f64> = entries
                    .iter()
                    .filter_map(number_value)
                    .filter(|v| *v > 0.0)
                    .map(round2)
                    .filter(|v| radius_km <= 0.0 || *v <= radius_km)
                    .collect();
                zones.sort_by(f64::total_cmp);
                zones.dedup_by(|a, b| same_km(*a, *b));
                zones
            })
            .unwrap_or_else(|| defaults.zone_breaks_km.clone());
        let radius_pricing = if radius_km <= 0.0 {
            Vec::new()
        } else {
            raw.get("travelRadiusPricing")
                .and_then(Value::as_array)
                .map(|entries| tiers_from_entries(entries, radius_km))
                .unwrap_or_else(|| defaults.radius_pricing.clone())
        };
        let base_location = location_value(raw.get("location"))
            .or_else(|| location_value(raw.get("baseLocation")))
            .or(defaults.base_location);
        TravelPolicy {
            radius_km,
            zone_breaks_km,
            radius_pricing,
            base_location,
        }
    }
}

impl Default for TravelPolicy {
    fn default() -> Self {
        TravelPolicy {
            radius_km: 0.0,
            zone_breaks_km: Vec::new(),
            radius_pricing: Vec::new(),
            base_location: None,
        }
    }
}

fn tiers_from_entries(entries: &[Value], radius_km: f64) -> Vec<PriceTier> {
    let mut tiers: Vec<PriceTier> = entries
        .iter()
        .filter_map(|entry| {
            let up_to = entry
                .get("upToKm")
                .or_else(|| entry.get("km"))
                .and_then(number_value)?;
            let price_delta = entry
                .get("priceDelta")
                .or_else(|| entry.get("price"))
                .and_then(number_value)
                .map(|v| Money::from_major(v.max(0.0)))
                .unwrap_or(Money::ZERO);
            Some(PriceTier {
                up_to_km: round2(up_to.clamp(0.0, radius_km)),
                price_delta,
            })
        })
        .collect();
    tiers.sort_by(|a, b| {
        a.up_to_km
            .total_cmp(&b.up_to_km)
            .then(a.price_delta.cmp(&b.price_delta))
    });
    // Identical distances collapse onto the higher surcharge.
    tiers.dedup_by(|next, kept| {
        if same_km(next.up_to_km, kept.up_to_km) {
            if next.price_delta > kept.price_delta {
                kept.price_delta = next.price_delta;
            }
            true
        } else {
            false
        }
    });
    tiers
}

fn location_value(raw: Option<&Value>) -> Option<Coordinate> {
    let raw = raw?;
    let lat = number_field(raw, "lat")?;
    let lng = number_field(raw, "lng").or_else(|| number_field(raw, "lon"))?;
    Coordinate::new(lat, lng).ok()
}

fn same_km(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
