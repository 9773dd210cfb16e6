use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use social_search_client::GeoPoint;

const UNKNOWN: &str = "Unknown";
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A resolved postal address for a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Human-readable single line, e.g. "1600 Pennsylvania Ave NW, Washington, DC".
    pub line: String,
    pub locality: Option<String>,
    /// State / province.
    pub admin_area: Option<String>,
    pub point: GeoPoint,
}

impl Address {
    /// Bucket used for realtime feeds; one feed per administrative area.
    pub fn region(&self) -> &str {
        non_blank(self.admin_area.as_deref())
    }

    pub fn city(&self) -> &str {
        non_blank(self.locality.as_deref())
    }
}

fn non_blank(part: Option<&str>) -> &str {
    match part.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => UNKNOWN,
    }
}

/// Reverse geocoding. `Ok(None)` means "no address here", which is not an error.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, point: GeoPoint) -> Result<Option<Address>>;
}

/// Resolves to the nearest entry of a fixed table, if one is close enough.
pub struct StaticAddressResolver {
    entries: Vec<Address>,
    max_distance_km: f64,
}

impl StaticAddressResolver {
    pub fn new(entries: Vec<Address>, max_distance_km: f64) -> Self {
        Self {
            entries,
            max_distance_km,
        }
    }
}

#[async_trait]
impl AddressResolver for StaticAddressResolver {
    async fn resolve(&self, point: GeoPoint) -> Result<Option<Address>> {
        let nearest = self
            .entries
            .iter()
            .map(|entry| (haversine_km(point, entry.point), entry))
            .filter(|(distance, _)| *distance <= self.max_distance_km)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, entry)| Address {
                point,
                ..entry.clone()
            });
        Ok(nearest)
    }
}

/// Great-circle distance between two points.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
