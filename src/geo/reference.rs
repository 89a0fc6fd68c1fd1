//! Reference collaborators used by the CLI and tests.
//!
//! The numerics here are illustrative: the resolver snaps to the nearest named
//! anchor point and the estimator is a generic attenuation curve. Deployments
//! plug in real region polygons and ground-motion models through the traits.

use crate::error::{Error, Result};
use crate::geo::{great_circle_km, GeoResolution, GeoResolver, IntensityEstimator};
use serde::{Deserialize, Serialize};

/// A named reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAnchor {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RegionAnchor {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Built-in anchors, used when the configuration names none
pub fn default_anchors() -> Vec<RegionAnchor> {
    vec![
        RegionAnchor::new("Honshu, Japan", 36.2, 138.3),
        RegionAnchor::new("Hokkaido, Japan", 43.2, 142.9),
        RegionAnchor::new("Central Chile", -33.4, -70.6),
        RegionAnchor::new("Southern California", 34.0, -117.5),
        RegionAnchor::new("Central Italy", 42.5, 13.2),
        RegionAnchor::new("Western Turkey", 38.4, 27.1),
        RegionAnchor::new("Sumatra, Indonesia", -0.6, 101.3),
        RegionAnchor::new("North Island, New Zealand", -38.7, 176.1),
        RegionAnchor::new("Iceland", 64.9, -18.6),
        RegionAnchor::new("Central Mexico", 19.4, -99.1),
    ]
}

/// Resolves a location to the nearest configured anchor
#[derive(Debug, Clone)]
pub struct NearestRegionResolver {
    anchors: Vec<RegionAnchor>,
}

impl NearestRegionResolver {
    pub fn new(anchors: Vec<RegionAnchor>) -> Self {
        Self { anchors }
    }

    pub fn anchors(&self) -> &[RegionAnchor] {
        &self.anchors
    }
}

impl Default for NearestRegionResolver {
    fn default() -> Self {
        Self::new(default_anchors())
    }
}

impl GeoResolver for NearestRegionResolver {
    fn resolve(&self, latitude: f64, longitude: f64, _depth: f64) -> Result<GeoResolution> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(Error::Geo(format!(
                "cannot resolve non-finite location ({}, {})",
                latitude, longitude
            )));
        }

        self.anchors
            .iter()
            .map(|anchor| {
                let distance =
                    great_circle_km(latitude, longitude, anchor.latitude, anchor.longitude);
                (anchor, distance)
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(anchor, distance)| GeoResolution {
                region: anchor.name.clone(),
                ocean_distance_km: distance,
            })
            .ok_or_else(|| Error::Geo("no region anchors configured".to_string()))
    }
}

/// Attenuation curve `exp(a * M) / (R + c)^b`, with `R` the hypocentral distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttenuationEstimator {
    pub magnitude_scale: f64,
    pub distance_offset_km: f64,
    pub distance_exponent: f64,
}

impl Default for AttenuationEstimator {
    fn default() -> Self {
        Self {
            magnitude_scale: 1.1,
            distance_offset_km: 10.0,
            distance_exponent: 1.6,
        }
    }
}

impl IntensityEstimator for AttenuationEstimator {
    fn estimate(&self, magnitude: f64, distance_km: f64, depth_km: f64) -> Result<f64> {
        if !magnitude.is_finite() || !distance_km.is_finite() || !depth_km.is_finite() {
            return Err(Error::Intensity(format!(
                "non-finite input (mag {}, dist {}, depth {})",
                magnitude, distance_km, depth_km
            )));
        }
        if distance_km < 0.0 {
            return Err(Error::Intensity(format!("negative distance {}", distance_km)));
        }

        let hypocentral = (distance_km.powi(2) + depth_km.powi(2)).sqrt();
        let value = (self.magnitude_scale * magnitude).exp()
            / (hypocentral + self.distance_offset_km).powf(self.distance_exponent);
        Ok(value)
    }
}
