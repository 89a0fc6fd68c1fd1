//! Geographic lookups and ground-motion estimation
//!
//! Both collaborators are plain synchronous calls. Intensity estimation runs
//! on the enrichment worker, while region resolution runs on whichever thread
//! asks for it, so a resolver may be called from several threads at once. The
//! `Send + Sync` bounds on both traits are what make that safe.

pub mod reference;

pub use reference::*;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Outcome of a region lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResolution {
    /// Human-readable region name
    pub region: String,
    /// Distance used for ground-motion estimation, in km
    pub ocean_distance_km: f64,
}

/// Resolves coordinates to a region name and a land/ocean distance
#[cfg_attr(test, mockall::automock)]
pub trait GeoResolver: Send + Sync {
    fn resolve(&self, latitude: f64, longitude: f64, depth: f64) -> Result<GeoResolution>;
}

/// Estimates peak ground acceleration for an event
#[cfg_attr(test, mockall::automock)]
pub trait IntensityEstimator: Send + Sync {
    fn estimate(&self, magnitude: f64, distance_km: f64, depth_km: f64) -> Result<f64>;
}

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in km (haversine)
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_great_circle_zero() {
        assert_eq!(great_circle_km(35.0, 139.0, 35.0, 139.0), 0.0);
    }

    #[test]
    fn test_great_circle_quarter_meridian() {
        let d = great_circle_km(0.0, 0.0, 90.0, 0.0);
        let expected = std::f64::consts::FRAC_PI_2 * EARTH_RADIUS_KM;
        assert!((d - expected).abs() < 1e-6);
    }
}
