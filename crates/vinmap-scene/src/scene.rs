//! The scene document and the pure function that assembles it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vinmap_core::raw::{ItemsDocument, OverrideMap, RawGrape, RawProducer, RawSubRegion, RawWine};
use vinmap_core::{GeoTuning, Grape, Producer, ProducerGrapePoint, SubRegion, Wine};
use vinmap_storage::{
    load_optional, load_required, InputError, OptionalStatus, GRAPES_FILE, OVERRIDES_FILE,
    PRODUCERS_FILE, PRODUCER_GRAPE_POINTS_FILE, PRODUCER_POINTS_FILE, SUB_REGIONS_FILE,
    SUB_REGION_POINTS_FILE, SUB_REGION_POLYGONS_FILE, WINES_FILE,
};

use crate::geojson::{join_polygons, FeatureCollection};
use crate::normalize;

/// Every source document, parsed but not yet normalized.
#[derive(Debug, Clone, Default)]
pub struct SceneInputs {
    pub wines: Vec<RawWine>,
    pub producers: Vec<RawProducer>,
    pub sub_regions: Vec<RawSubRegion>,
    pub grapes: Vec<RawGrape>,
    pub producer_grape_points: FeatureCollection,
    pub producer_points: FeatureCollection,
    pub sub_region_points: FeatureCollection,
    pub sub_region_polygons: FeatureCollection,
    pub overrides: OverrideMap,
    pub polygons_status: Option<OptionalStatus>,
    pub overrides_status: Option<OptionalStatus>,
}

impl SceneInputs {
    /// Load every document from `source_dir`. All required documents are
    /// read before anything is normalized, so a missing one fails the run
    /// up front.
    pub fn load(source_dir: &Path) -> Result<Self, InputError> {
        let wines: ItemsDocument<RawWine> = load_required(source_dir.join(WINES_FILE))?;
        let producers: ItemsDocument<RawProducer> = load_required(source_dir.join(PRODUCERS_FILE))?;
        let sub_regions: ItemsDocument<RawSubRegion> =
            load_required(source_dir.join(SUB_REGIONS_FILE))?;
        let grapes: ItemsDocument<RawGrape> = load_required(source_dir.join(GRAPES_FILE))?;
        let producer_grape_points = load_required(source_dir.join(PRODUCER_GRAPE_POINTS_FILE))?;
        let producer_points = load_required(source_dir.join(PRODUCER_POINTS_FILE))?;
        let sub_region_points = load_required(source_dir.join(SUB_REGION_POINTS_FILE))?;

        let polygons = load_optional::<FeatureCollection>(source_dir.join(SUB_REGION_POLYGONS_FILE));
        let overrides = load_optional::<OverrideMap>(source_dir.join(OVERRIDES_FILE));

        Ok(Self {
            wines: wines.items,
            producers: producers.items,
            sub_regions: sub_regions.items,
            grapes: grapes.items,
            producer_grape_points,
            producer_points,
            sub_region_points,
            sub_region_polygons: polygons.value,
            overrides: overrides.value,
            polygons_status: Some(polygons.status),
            overrides_status: Some(overrides.status),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneCounts {
    pub wines: usize,
    pub producers: usize,
    pub sub_regions: usize,
    pub grapes: usize,
    pub producer_grape_points: usize,
    pub manual_override_producers: usize,
    pub sub_region_polygons: usize,
}

/// Raw layers handed to the map as-is (polygons rewritten by the join).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneGeoJson {
    pub producers: FeatureCollection,
    pub sub_regions: FeatureCollection,
    pub sub_region_polygons: FeatureCollection,
    pub producer_grape_points: FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub generated_at_unix: i64,
    pub counts: SceneCounts,
    pub wines: Vec<Wine>,
    pub producers: Vec<Producer>,
    pub sub_regions: Vec<SubRegion>,
    pub grapes: Vec<Grape>,
    pub producer_grape_points: Vec<ProducerGrapePoint>,
    pub geojson: SceneGeoJson,
}

/// Normalize and join all inputs. Deterministic for a given
/// `(inputs, tuning, generated_at_unix)`.
pub fn build_scene(inputs: SceneInputs, tuning: &GeoTuning, generated_at_unix: i64) -> Scene {
    let wines: Vec<Wine> = inputs
        .wines
        .into_iter()
        .enumerate()
        .map(|(index, raw)| normalize::normalize_wine(raw, index, tuning))
        .collect();

    let centroids = normalize::sub_region_centroids(&wines, &tuning.bounds);

    let overrides = normalize::override_index(inputs.overrides);
    let producers: Vec<Producer> = inputs
        .producers
        .into_iter()
        .filter_map(|raw| normalize::normalize_producer(raw, &overrides, tuning))
        .collect();

    let sub_regions: Vec<SubRegion> = inputs
        .sub_regions
        .into_iter()
        .filter_map(|raw| normalize::normalize_sub_region(raw, &centroids, tuning))
        .collect();

    let grapes: Vec<Grape> = inputs
        .grapes
        .into_iter()
        .filter_map(normalize::normalize_grape)
        .collect();

    let producer_grape_points = normalize::producer_grape_points(&inputs.producer_grape_points);

    let sub_region_polygons = join_polygons(inputs.sub_region_polygons, &sub_regions, tuning);

    let counts = SceneCounts {
        wines: wines.len(),
        producers: producers.len(),
        sub_regions: sub_regions.len(),
        grapes: grapes.len(),
        producer_grape_points: producer_grape_points.len(),
        manual_override_producers: producers
            .iter()
            .filter(|p| p.location.source.as_deref() == Some(tuning.manual_override.source.as_str()))
            .count(),
        sub_region_polygons: sub_region_polygons.features.len(),
    };

    Scene {
        generated_at_unix,
        counts,
        wines,
        producers,
        sub_regions,
        grapes,
        producer_grape_points,
        geojson: SceneGeoJson {
            producers: inputs.producer_points,
            sub_regions: inputs.sub_region_points,
            sub_region_polygons,
            producer_grape_points: inputs.producer_grape_points,
        },
    }
}
