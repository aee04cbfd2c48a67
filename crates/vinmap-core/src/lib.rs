//! Core domain model for the Bourgogne wine map scene.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod coerce;
pub mod geo;
pub mod raw;
pub mod text;

pub use geo::{GeoBounds, GeoTuning, LatLng, LocationFallback, PriceThresholds, RegionCenter, TuningError};
pub use text::{extract_style_keywords, normalize_whitespace, slugify};

pub const CRATE_NAME: &str = "vinmap-core";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBucket {
    Entry,
    Mid,
    Premium,
    Iconic,
    Unknown,
}

impl PriceBucket {
    /// Parse an upstream bucket label; anything unrecognised is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "entry" => Some(Self::Entry),
            "mid" => Some(Self::Mid),
            "premium" => Some(Self::Premium),
            "iconic" => Some(Self::Iconic),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Bucket for a price. Zero and negative prices are treated as unknown.
    pub fn for_price(price: Option<f64>, thresholds: &PriceThresholds) -> Self {
        match price {
            Some(p) if p.is_finite() && p > 0.0 => {
                if p < thresholds.mid {
                    Self::Entry
                } else if p < thresholds.premium {
                    Self::Mid
                } else if p < thresholds.iconic {
                    Self::Premium
                } else {
                    Self::Iconic
                }
            }
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// A resolved coordinate with its provenance.
///
/// `source` names the resolution path that produced `lat`/`lng`; fallbacks
/// rewrite it so it never describes a coordinate that was replaced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub source: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Location {
    pub fn point(&self) -> Option<LatLng> {
        LatLng::from_parts(self.lat, self.lng)
    }

    pub fn in_bounds(&self, bounds: &GeoBounds) -> bool {
        bounds.contains_parts(self.lat, self.lng)
    }

    /// Move to `point`, tag the move with `source`, and raise confidence to
    /// at least `floor`.
    pub fn relocate(&mut self, point: LatLng, source: String, floor: f64) {
        self.lat = Some(point.lat);
        self.lng = Some(point.lng);
        self.source = Some(source);
        self.confidence = Some(self.confidence.map_or(floor, |c| c.max(floor)));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    pub id: String,
    pub title: Option<String>,
    pub producer: Option<String>,
    pub sub_region: Option<String>,
    pub grape: Option<String>,
    pub bottle_size: Option<String>,
    pub stock: Option<f64>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub style_keywords: Vec<String>,
    pub price_bucket: PriceBucket,
    pub price: Option<f64>,
    pub map: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub id: String,
    pub name: String,
    pub wine_count: Option<u64>,
    pub primary_sub_region: Option<String>,
    pub grapes: BTreeMap<String, u64>,
    pub sub_regions: BTreeMap<String, u64>,
    pub price: PriceSummary,
    pub location: Location,
    pub override_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRegion {
    pub id: String,
    pub name: String,
    pub wine_count: Option<u64>,
    pub producer_count: Option<u64>,
    pub grapes: BTreeMap<String, u64>,
    pub price: PriceSummary,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grape {
    pub id: String,
    pub name: String,
    pub wine_count: Option<u64>,
    pub producer_count: Option<u64>,
    pub dominant_style_keywords: Vec<String>,
    pub centroid: Option<LatLng>,
    pub price: PriceSummary,
}

/// One scatter-layer point per (producer, grape) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerGrapePoint {
    pub id: String,
    pub producer: String,
    pub grape: String,
    pub lat: f64,
    pub lng: f64,
    pub wine_count: Option<u64>,
    pub avg_price: Option<f64>,
    pub dominant_style_keywords: Vec<String>,
}
