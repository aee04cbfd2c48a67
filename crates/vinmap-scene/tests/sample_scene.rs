use std::path::PathBuf;

use serde_json::Value;
use tempfile::tempdir;
use vinmap_core::{GeoTuning, PriceBucket};
use vinmap_scene::{load_scene, report_markdown, SceneConfig, ScenePipeline};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/sample")
}

fn pipeline_into(output_dir: PathBuf) -> (SceneConfig, ScenePipeline) {
    let mut config = SceneConfig::for_root(output_dir.clone());
    config.source_dir = Some(fixture_dir());
    config.output_dir = output_dir;
    let pipeline = ScenePipeline::new(config.clone()).expect("pipeline");
    (config, pipeline)
}

fn close(actual: Option<f64>, expected: f64) -> bool {
    actual.is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[test]
fn sample_fixtures_build_a_consistent_scene() {
    let out = tempdir().expect("tempdir");
    let (config, pipeline) = pipeline_into(out.path().join("public/data"));

    let summary = pipeline.run_once().expect("build");
    let expected_path = config.scene_path().display().to_string();
    assert_eq!(summary.output_path.as_deref(), Some(expected_path.as_str()));
    assert_eq!(summary.content_hash.as_ref().map(String::len), Some(64));

    let scene = load_scene(config.scene_path()).expect("scene");
    assert_eq!(scene.counts, summary.counts);
    assert_eq!(scene.counts.wines, 5);
    assert_eq!(scene.counts.producers, 4);
    assert_eq!(scene.counts.sub_regions, 4);
    assert_eq!(scene.counts.grapes, 2);
    assert_eq!(scene.counts.producer_grape_points, 3);
    assert_eq!(scene.counts.manual_override_producers, 1);
    assert_eq!(scene.counts.sub_region_polygons, 3);
    assert_eq!(scene.geojson.producers.features.len(), 2);
    assert_eq!(scene.geojson.sub_regions.features.len(), 1);
}

#[test]
fn sample_wines_resolve_price_and_derived_fields() {
    let out = tempdir().expect("tempdir");
    let (_config, pipeline) = pipeline_into(out.path().to_path_buf());
    let (_source, scene) = pipeline.build(chrono::Utc::now()).expect("build");

    let montee = scene.wines.iter().find(|w| w.id == "18233").expect("18233");
    assert_eq!(montee.price, Some(689.0));
    assert_eq!(montee.title.as_deref(), Some("Chablis Premier Cru Montée de Tonnerre 2021"));

    let petit = scene.wines.iter().find(|w| w.id == "18240").expect("18240");
    assert_eq!(petit.price, Some(219.9));
    assert_eq!(petit.price_bucket, PriceBucket::Entry);
    assert_eq!(petit.stock, None);
    assert_eq!(petit.style_keywords, vec!["fruity", "fresh"]);
}

#[test]
fn sample_locations_follow_override_and_fallback_rules() {
    let out = tempdir().expect("tempdir");
    let (_config, pipeline) = pipeline_into(out.path().to_path_buf());
    let (_source, scene) = pipeline.build(chrono::Utc::now()).expect("build");

    let leflaive = scene.producers.iter().find(|p| p.id == "domaine-leflaive").expect("leflaive");
    assert_eq!(leflaive.location.source.as_deref(), Some("manual_override"));
    assert_eq!(leflaive.location.confidence, Some(0.95));
    assert_eq!(leflaive.location.lat, Some(46.9477));
    assert_eq!(leflaive.override_note.as_deref(), Some("Cellar door on Place des Marronniers"));

    let fevre = scene.producers.iter().find(|p| p.id == "domaine-william-fevre").expect("fevre");
    assert_eq!(fevre.location.source.as_deref(), Some("producer_geocode"));
    assert_eq!(fevre.location.label.as_deref(), Some("Domaine William Fèvre, Chablis"));

    let chablis = scene.sub_regions.iter().find(|s| s.id == "chablis").expect("chablis");
    assert!(close(chablis.location.lat, 47.85));
    assert!(close(chablis.location.lng, 3.75));
    assert_eq!(chablis.location.confidence, Some(0.72));
    assert_eq!(
        chablis.location.source.as_deref(),
        Some("sub_region_geocode+wine_centroid_fallback")
    );

    let bourgogne = scene.sub_regions.iter().find(|s| s.id == "bourgogne").expect("bourgogne");
    assert_eq!(bourgogne.location.lat, Some(47.16));
    assert_eq!(bourgogne.location.lng, Some(4.85));
    assert_eq!(bourgogne.location.confidence, Some(0.65));

    let puligny = scene.sub_regions.iter().find(|s| s.id == "puligny-montrachet").expect("puligny");
    assert_eq!(puligny.location.source.as_deref(), Some("sub_region_geocode"));
}

#[test]
fn sample_polygons_are_joined_not_dropped() {
    let out = tempdir().expect("tempdir");
    let (_config, pipeline) = pipeline_into(out.path().to_path_buf());
    let (_source, scene) = pipeline.build(chrono::Utc::now()).expect("build");

    let polygons = &scene.geojson.sub_region_polygons.features;
    let by_id = |id: &str| {
        polygons
            .iter()
            .find(|f| f.properties.get("id") == Some(&Value::String(id.to_string())))
            .map(|f| f.properties.clone())
            .expect("polygon")
    };

    let chablis = by_id("chablis");
    assert_eq!(chablis["wine_count"], Value::from(2u64));
    assert_eq!(chablis["avg_price"], Value::from(689.0));
    assert_eq!(chablis["display_name"], Value::from("Chablis, Yonne"));

    let puligny = by_id("puligny-montrachet");
    assert_eq!(puligny["sub_region"], Value::from("Puligny-Montrachet"));
    assert_eq!(puligny["source"], Value::from("nominatim_polygon"));

    let irancy = by_id("irancy");
    assert!(irancy["wine_count"].is_null());
    assert!(irancy["avg_price"].is_null());
}

#[test]
fn custom_tuning_changes_computed_buckets_and_polygon_source() {
    let out = tempdir().expect("tempdir");
    let (_config, pipeline) = pipeline_into(out.path().to_path_buf());
    let tuning = GeoTuning::from_yaml_str(
        "price_buckets:\n  mid: 200\npolygon_source: osm_boundary\n",
        "inline",
    )
    .expect("tuning");
    let pipeline = pipeline.with_tuning(tuning);
    let (_source, scene) = pipeline.build(chrono::Utc::now()).expect("build");

    let petit = scene.wines.iter().find(|w| w.id == "18240").expect("18240");
    assert_eq!(petit.price_bucket, PriceBucket::Mid);
    let montee = scene.wines.iter().find(|w| w.id == "18233").expect("18233");
    assert_eq!(montee.price_bucket, PriceBucket::Premium);

    assert!(scene
        .geojson
        .sub_region_polygons
        .features
        .iter()
        .all(|f| f.properties["source"] == Value::from("osm_boundary")));
}

#[test]
fn rebuilding_unchanged_inputs_only_changes_the_timestamp() {
    let out = tempdir().expect("tempdir");
    let (config, pipeline) = pipeline_into(out.path().to_path_buf());

    pipeline.run_once().expect("first build");
    let mut first: Value = serde_json::from_str(
        &std::fs::read_to_string(config.scene_path()).expect("read first"),
    )
    .expect("first json");
    pipeline.run_once().expect("second build");
    let mut second: Value = serde_json::from_str(
        &std::fs::read_to_string(config.scene_path()).expect("read second"),
    )
    .expect("second json");

    first["generated_at_unix"] = Value::Null;
    second["generated_at_unix"] = Value::Null;
    assert_eq!(first, second);
}

#[test]
fn optional_inputs_may_be_absent() {
    let src = tempdir().expect("tempdir");
    for entry in std::fs::read_dir(fixture_dir()).expect("fixtures") {
        let entry = entry.expect("entry");
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains("polygons") || name.contains("overrides") {
            continue;
        }
        std::fs::copy(entry.path(), src.path().join(&name)).expect("copy");
    }

    let out = tempdir().expect("tempdir");
    let mut config = SceneConfig::for_root(out.path());
    config.source_dir = Some(src.path().to_path_buf());
    let scene = {
        let pipeline = ScenePipeline::new(config.clone()).expect("pipeline");
        pipeline.run_once().expect("build");
        load_scene(config.scene_path()).expect("scene")
    };

    assert_eq!(scene.counts.sub_region_polygons, 0);
    assert_eq!(scene.counts.manual_override_producers, 0);
    assert_eq!(scene.geojson.sub_region_polygons.kind, "FeatureCollection");

    let report = report_markdown(&config.scene_path(), &config.tuning_file).expect("report");
    assert!(report.contains("- Producers: 4 (0 manual overrides)"));
    assert!(report.contains("`producer_geocode`: 1"));
}
