//! Schemas of the enriched upstream documents, as read from disk.
//!
//! Every field is optional and routed through [`crate::coerce`], so a record
//! with junk in one field still loads with that field absent.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::coerce;

/// `{ "items": [...] }` envelope shared by every enriched document.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsDocument<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPrice {
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub listing_sale_price: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub product_ldjson_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPriceSummary {
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub avg: Option<f64>,
}

/// Location block used by wines (`map`), producers and sub-regions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocation {
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDerived {
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub price_bucket: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_string_list")]
    pub style_keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWine {
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub name_product: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub title_listing: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub producer: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub sub_region: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub grape: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub bottle_size: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub stock: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub price_brl: Option<RawPrice>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub map: Option<RawLocation>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub derived: Option<RawDerived>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProducer {
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub producer: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_count")]
    pub wine_count: Option<u64>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub primary_sub_region: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_count_map")]
    pub grapes: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "coerce::safe_count_map")]
    pub sub_regions: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub price_brl: Option<RawPriceSummary>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub location: Option<RawLocation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubRegion {
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub sub_region: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_count")]
    pub wine_count: Option<u64>,
    #[serde(default, deserialize_with = "coerce::safe_count")]
    pub producer_count: Option<u64>,
    #[serde(default, deserialize_with = "coerce::safe_count_map")]
    pub grapes: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub price_brl: Option<RawPriceSummary>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub location: Option<RawLocation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCentroid {
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGrape {
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub grape: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_count")]
    pub wine_count: Option<u64>,
    #[serde(default, deserialize_with = "coerce::safe_count")]
    pub producer_count: Option<u64>,
    #[serde(default, deserialize_with = "coerce::safe_string_list")]
    pub dominant_style_keywords: Option<Vec<String>>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub centroid: Option<RawCentroid>,
    #[serde(default, deserialize_with = "coerce::lenient")]
    pub price_brl: Option<RawPriceSummary>,
}

/// One entry of `producer-coordinate-overrides.json`, keyed by producer name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOverride {
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_number")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "coerce::safe_text")]
    pub note: Option<String>,
}

pub type OverrideMap = BTreeMap<String, RawOverride>;
