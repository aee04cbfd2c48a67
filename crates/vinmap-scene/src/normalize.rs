//! Per-entity normalization: raw enriched records in, scene entities out.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use vinmap_core::raw::{
    OverrideMap, RawGrape, RawLocation, RawPriceSummary, RawProducer, RawSubRegion, RawWine,
};
use vinmap_core::{
    extract_style_keywords, normalize_whitespace, slugify, GeoBounds, GeoTuning, Grape, LatLng,
    Location, LocationFallback, PriceBucket, PriceSummary, Producer, ProducerGrapePoint, SubRegion,
    Wine,
};

use crate::geojson::FeatureCollection;

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn price_summary(raw: Option<RawPriceSummary>) -> PriceSummary {
    raw.map(|p| PriceSummary {
        min: p.min,
        max: p.max,
        avg: p.avg,
    })
    .unwrap_or_default()
}

fn location_verbatim(raw: Option<RawLocation>) -> Location {
    raw.map(|l| Location {
        lat: l.lat,
        lng: l.lng,
        source: l.source,
        confidence: l.confidence,
        label: l.display_name,
    })
    .unwrap_or_default()
}

pub fn normalize_wine(raw: RawWine, index: usize, tuning: &GeoTuning) -> Wine {
    let title = raw.name_product.or(raw.title_listing);

    let price = raw
        .price_brl
        .as_ref()
        .and_then(|p| p.listing_sale_price.or(p.product_ldjson_price));

    let derived = raw.derived.unwrap_or_default();
    let price_bucket = derived
        .price_bucket
        .as_deref()
        .and_then(PriceBucket::from_label)
        .unwrap_or_else(|| PriceBucket::for_price(price, &tuning.price_buckets));
    let style_keywords = derived.style_keywords.unwrap_or_else(|| {
        raw.description
            .as_deref()
            .map(extract_style_keywords)
            .unwrap_or_default()
    });

    let map = raw.map.and_then(|m| {
        let point = LatLng::from_parts(m.lat, m.lng)?;
        Some(Location {
            lat: Some(point.lat),
            lng: Some(point.lng),
            source: m.source,
            confidence: m.confidence,
            label: None,
        })
    });

    let id = raw
        .id
        .or(raw.slug)
        .or_else(|| title.as_deref().map(slugify).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| format!("wine-{index}"));

    Wine {
        id,
        title,
        producer: raw.producer,
        sub_region: raw.sub_region,
        grape: raw.grape,
        bottle_size: raw.bottle_size,
        stock: raw.stock,
        description: raw.description,
        url: raw.url,
        style_keywords,
        price_bucket,
        price,
        map,
    }
}

/// Mean in-bounds wine position per sub-region slug.
pub fn sub_region_centroids(wines: &[Wine], bounds: &GeoBounds) -> BTreeMap<String, LatLng> {
    let mut sums: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
    for wine in wines {
        let Some(name) = wine.sub_region.as_deref() else {
            continue;
        };
        let Some(point) = wine.map.as_ref().and_then(Location::point) else {
            continue;
        };
        if !bounds.contains(point) {
            continue;
        }
        let slug = slugify(name);
        if slug.is_empty() {
            continue;
        }
        let entry = sums.entry(slug).or_insert((0.0, 0.0, 0));
        entry.0 += point.lat;
        entry.1 += point.lng;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(slug, (lat, lng, n))| {
            let n = n as f64;
            (
                slug,
                LatLng {
                    lat: round6(lat / n),
                    lng: round6(lng / n),
                },
            )
        })
        .collect()
}

/// Override table keyed the way producer names are normalized, so keys with
/// stray whitespace still match. Keys that normalize to nothing are dropped.
pub fn override_index(overrides: OverrideMap) -> OverrideMap {
    let mut index = OverrideMap::new();
    for (key, manual) in overrides {
        let name = normalize_whitespace(&key);
        if name.is_empty() {
            warn!("ignoring manual override with a blank producer name");
            continue;
        }
        if index.insert(name.clone(), manual).is_some() {
            warn!(producer = %name, "duplicate manual override; keeping the last entry");
        }
    }
    index
}

/// Producer with its location resolved. A manual override with finite
/// coordinates replaces whatever the enrichment found. `overrides` is
/// expected to come from [`override_index`].
pub fn normalize_producer(
    raw: RawProducer,
    overrides: &OverrideMap,
    tuning: &GeoTuning,
) -> Option<Producer> {
    let Some(name) = raw.producer else {
        warn!("skipping producer record without a name");
        return None;
    };

    let mut location = location_verbatim(raw.location);
    let mut override_note = None;

    if let Some(manual) = overrides.get(&name) {
        match LatLng::from_parts(manual.lat, manual.lng) {
            Some(point) => {
                if !tuning.bounds.contains(point) {
                    warn!(producer = %name, lat = point.lat, lng = point.lng, "manual override lies outside the map bounds");
                }
                location = Location {
                    lat: Some(point.lat),
                    lng: Some(point.lng),
                    source: Some(tuning.manual_override.source.clone()),
                    confidence: Some(tuning.manual_override.confidence),
                    label: Some(manual.label.clone().unwrap_or_else(|| name.clone())),
                };
                override_note = manual.note.clone();
            }
            None => {
                warn!(producer = %name, "manual override ignored: coordinates missing or not finite");
            }
        }
    }

    Some(Producer {
        id: slugify(&name),
        name,
        wine_count: raw.wine_count,
        primary_sub_region: raw.primary_sub_region,
        grapes: raw.grapes,
        sub_regions: raw.sub_regions,
        price: price_summary(raw.price_brl),
        location,
        override_note,
    })
}

/// Sub-region with out-of-bounds or missing locations repaired by the
/// configured fallback chain.
pub fn normalize_sub_region(
    raw: RawSubRegion,
    centroids: &BTreeMap<String, LatLng>,
    tuning: &GeoTuning,
) -> Option<SubRegion> {
    let Some(name) = raw.sub_region else {
        warn!("skipping sub-region record without a name");
        return None;
    };
    let id = slugify(&name);

    let mut location = location_verbatim(raw.location);
    location.label = None;

    for step in tuning.sub_region_fallbacks() {
        if location.in_bounds(&tuning.bounds) {
            break;
        }
        match step {
            LocationFallback::WineCentroid(policy) => {
                if let Some(centroid) = centroids.get(&id) {
                    let source = tuning.compose_source(location.source.as_deref(), &policy.marker);
                    debug!(sub_region = %name, %source, "applying wine centroid fallback");
                    location.relocate(*centroid, source, policy.confidence_floor);
                }
            }
            LocationFallback::RegionCenter(center) => {
                if center.slug == id {
                    let source = tuning.compose_source(location.source.as_deref(), &center.marker);
                    debug!(sub_region = %name, %source, "applying fixed region center");
                    location.relocate(center.point(), source, center.confidence_floor);
                }
            }
        }
    }

    if !location.in_bounds(&tuning.bounds) {
        debug!(sub_region = %name, "sub-region location still outside bounds after fallbacks");
    }

    Some(SubRegion {
        id,
        name,
        wine_count: raw.wine_count,
        producer_count: raw.producer_count,
        grapes: raw.grapes,
        price: price_summary(raw.price_brl),
        location,
    })
}

pub fn normalize_grape(raw: RawGrape) -> Option<Grape> {
    let Some(name) = raw.grape else {
        warn!("skipping grape record without a name");
        return None;
    };
    Some(Grape {
        id: slugify(&name),
        name,
        wine_count: raw.wine_count,
        producer_count: raw.producer_count,
        dominant_style_keywords: raw.dominant_style_keywords.unwrap_or_default(),
        centroid: raw.centroid.and_then(|c| LatLng::from_parts(c.lat, c.lng)),
        price: price_summary(raw.price_brl),
    })
}

/// Scatter-layer rows from the producer/grape point layer.
pub fn producer_grape_points(collection: &FeatureCollection) -> Vec<ProducerGrapePoint> {
    collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let Some(point) = feature.point() else {
                debug!(index, "skipping producer/grape feature without a usable point");
                return None;
            };
            let Some(producer) = feature.text_property("producer") else {
                debug!(index, "skipping producer/grape feature without a producer");
                return None;
            };
            let grape = feature
                .text_property("grape")
                .unwrap_or_else(|| "Unknown".to_string());
            Some(ProducerGrapePoint {
                id: format!("{}--{}", slugify(&producer), slugify(&grape)),
                producer,
                grape,
                lat: point.lat,
                lng: point.lng,
                wine_count: feature.count_property("wine_count"),
                avg_price: feature.number_property("avg_price_brl"),
                dominant_style_keywords: feature.string_list_property("dominant_style_keywords"),
            })
        })
        .collect()
}
