//! Geographic gate and the tuning table that drives every location fallback.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Both components present and finite.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(Self { lat, lng }),
            _ => None,
        }
    }
}

/// Inclusive latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl GeoBounds {
    pub const BOURGOGNE: Self = Self {
        lat_min: 46.1,
        lat_max: 48.4,
        lng_min: 2.95,
        lng_max: 6.1,
    };

    pub fn contains(&self, point: LatLng) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.lat)
            && (self.lng_min..=self.lng_max).contains(&point.lng)
    }

    /// Missing or partial coordinates are never in bounds.
    pub fn contains_parts(&self, lat: Option<f64>, lng: Option<f64>) -> bool {
        LatLng::from_parts(lat, lng).is_some_and(|p| self.contains(p))
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::BOURGOGNE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentroidFallback {
    pub marker: String,
    pub confidence_floor: f64,
}

impl Default for CentroidFallback {
    fn default() -> Self {
        Self {
            marker: "wine_centroid_fallback".to_string(),
            confidence_floor: 0.72,
        }
    }
}

/// Hardcoded center for one region slug, used when nothing better exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCenter {
    pub slug: String,
    pub lat: f64,
    pub lng: f64,
    pub marker: String,
    pub confidence_floor: f64,
}

impl RegionCenter {
    pub fn bourgogne() -> Self {
        Self {
            slug: "bourgogne".to_string(),
            lat: 47.16,
            lng: 4.85,
            marker: "bourgogne_manual_center".to_string(),
            confidence_floor: 0.65,
        }
    }

    pub fn point(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOverridePolicy {
    pub source: String,
    pub confidence: f64,
}

impl Default for ManualOverridePolicy {
    fn default() -> Self {
        Self {
            source: "manual_override".to_string(),
            confidence: 0.95,
        }
    }
}

/// Lower bounds (inclusive) of the mid, premium and iconic price buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceThresholds {
    pub mid: f64,
    pub premium: f64,
    pub iconic: f64,
}

impl Default for PriceThresholds {
    fn default() -> Self {
        Self {
            mid: 250.0,
            premium: 600.0,
            iconic: 1200.0,
        }
    }
}

/// One sub-region fallback step. Steps run in the order returned by
/// [`GeoTuning::sub_region_fallbacks`] and each only fires while the location
/// is still missing or out of bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationFallback<'a> {
    WineCentroid(&'a CentroidFallback),
    RegionCenter(&'a RegionCenter),
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("reading tuning file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing tuning file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Every domain constant the scene build depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoTuning {
    pub bounds: GeoBounds,
    /// Base provenance tag used when a fallback lands on a location that
    /// never had one.
    pub unknown_source: String,
    pub centroid_fallback: CentroidFallback,
    pub region_centers: Vec<RegionCenter>,
    pub manual_override: ManualOverridePolicy,
    pub polygon_source: String,
    pub price_buckets: PriceThresholds,
}

impl Default for GeoTuning {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::BOURGOGNE,
            unknown_source: "unknown".to_string(),
            centroid_fallback: CentroidFallback::default(),
            region_centers: vec![RegionCenter::bourgogne()],
            manual_override: ManualOverridePolicy::default(),
            polygon_source: "nominatim_polygon".to_string(),
            price_buckets: PriceThresholds::default(),
        }
    }
}

impl GeoTuning {
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, TuningError> {
        serde_yaml::from_str(text).map_err(|source| TuningError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load overrides from a YAML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| TuningError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }

    pub fn sub_region_fallbacks(&self) -> Vec<LocationFallback<'_>> {
        std::iter::once(LocationFallback::WineCentroid(&self.centroid_fallback))
            .chain(self.region_centers.iter().map(LocationFallback::RegionCenter))
            .collect()
    }

    /// `base+marker`, or `unknown+marker` when there is no base tag.
    pub fn compose_source(&self, base: Option<&str>, marker: &str) -> String {
        let base = base
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(&self.unknown_source);
        format!("{base}+{marker}")
    }
}
