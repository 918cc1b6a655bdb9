//! Straight-line proximity matching.

use pawlink_common::config::DispatchConfig;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `(0, 0)` and non-finite coordinates mean "no location given".
    #[must_use]
    pub fn is_unset(&self) -> bool {
        !self.latitude.is_finite()
            || !self.longitude.is_finite()
            || (self.latitude == 0.0 && self.longitude == 0.0)
    }

    /// Whether both coordinates lie within their valid ranges.
    #[must_use]
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance between two points using the haversine formula.
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Whether two points lie within `radius_km` of each other.
///
/// Always false when either point is unset.
#[must_use]
pub fn within_radius(a: GeoPoint, b: GeoPoint, radius_km: f64) -> bool {
    !a.is_unset() && !b.is_unset() && distance_km(a, b) <= radius_km
}

/// Matcher bound to the configured radius.
#[derive(Debug, Clone, Copy)]
pub struct GeoMatcher {
    radius_km: f64,
}

impl GeoMatcher {
    #[must_use]
    pub const fn new(radius_km: f64) -> Self {
        Self { radius_km }
    }

    #[must_use]
    pub const fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.match_radius_km)
    }

    #[must_use]
    pub const fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Distance between the points if they are both set and within range.
    #[must_use]
    pub fn distance_within(&self, a: GeoPoint, b: GeoPoint) -> Option<f64> {
        if a.is_unset() || b.is_unset() {
            return None;
        }
        let distance = distance_km(a, b);
        (distance <= self.radius_km).then_some(distance)
    }
}

impl Default for GeoMatcher {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}
