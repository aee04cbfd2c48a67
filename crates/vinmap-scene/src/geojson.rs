//! Minimal GeoJSON passthrough types plus the polygon/sub-region join.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use vinmap_core::{coerce, slugify, GeoTuning, LatLng, SubRegion};

fn feature_collection_kind() -> String {
    "FeatureCollection".to_string()
}

fn feature_kind() -> String {
    "Feature".to_string()
}

/// `null` or non-object properties load as an empty object.
fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// A FeatureCollection kept close to its on-disk form. Unknown members
/// (`bbox`, `crs`, ...) are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_kind")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            kind: feature_collection_kind(),
            features: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_kind")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feature {
    /// Point geometry as a named pair. GeoJSON stores `[lng, lat]`.
    pub fn point(&self) -> Option<LatLng> {
        if self.geometry.get("type").and_then(Value::as_str) != Some("Point") {
            return None;
        }
        let coords = self.geometry.get("coordinates")?.as_array()?;
        let lng = coerce::number(coords.first()?);
        let lat = coerce::number(coords.get(1)?);
        LatLng::from_parts(lat, lng)
    }

    pub fn text_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(coerce::text)
    }

    pub fn number_property(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(coerce::number)
    }

    pub fn count_property(&self, key: &str) -> Option<u64> {
        self.properties.get(key).and_then(coerce::count)
    }

    pub fn string_list_property(&self, key: &str) -> Vec<String> {
        self.properties
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(coerce::text)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn optional_number(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

fn optional_count(value: Option<u64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

/// Annotate every polygon with the stats of the sub-region it outlines.
///
/// The slug of the `id` property is tried first, then the slug of
/// `sub_region`; upstream ids drop accented letters (`mcon-villages`), so the
/// name is the one that matches for accented appellations. The matched slug
/// is written back to `id`. Polygons without a matching sub-region keep null
/// stats and are never dropped.
pub fn join_polygons(
    polygons: FeatureCollection,
    sub_regions: &[SubRegion],
    tuning: &GeoTuning,
) -> FeatureCollection {
    let by_id: BTreeMap<&str, &SubRegion> = sub_regions
        .iter()
        .map(|sr| (sr.id.as_str(), sr))
        .collect();

    let features = polygons
        .features
        .into_iter()
        .map(|mut feature| {
            let candidates: Vec<String> = ["id", "sub_region"]
                .iter()
                .filter_map(|key| feature.text_property(key))
                .map(|name| slugify(&name))
                .filter(|id| !id.is_empty())
                .collect();
            let matched = candidates.iter().find_map(|id| by_id.get(id.as_str()).copied());
            let region_id = matched
                .map(|sr| sr.id.clone())
                .or_else(|| candidates.into_iter().next());

            let props = &mut feature.properties;
            if let Some(id) = region_id {
                props.insert("id".into(), Value::String(id));
            }
            match matched {
                Some(sr) => {
                    props.insert("sub_region".into(), Value::String(sr.name.clone()));
                    props.insert("wine_count".into(), optional_count(sr.wine_count));
                    props.insert("producer_count".into(), optional_count(sr.producer_count));
                    props.insert("avg_price".into(), optional_number(sr.price.avg));
                }
                None => {
                    props.insert("wine_count".into(), Value::Null);
                    props.insert("producer_count".into(), Value::Null);
                    props.insert("avg_price".into(), Value::Null);
                }
            }
            props.insert("source".into(), Value::String(tuning.polygon_source.clone()));
            feature
        })
        .collect();

    FeatureCollection {
        features,
        ..polygons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vinmap_core::{Location, PriceSummary};

    fn sub_region(name: &str, wines: u64, avg: Option<f64>) -> SubRegion {
        SubRegion {
            id: slugify(name),
            name: name.to_string(),
            wine_count: Some(wines),
            producer_count: Some(2),
            grapes: Default::default(),
            price: PriceSummary {
                min: None,
                max: None,
                avg,
            },
            location: Location::default(),
        }
    }

    fn collection(value: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(value).expect("collection")
    }

    #[test]
    fn point_flips_lng_lat_order() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [4.3, 46.9] },
                "properties": null
            }]
        }));
        let point = fc.features[0].point().expect("point");
        assert_eq!(point.lat, 46.9);
        assert_eq!(point.lng, 4.3);
        assert!(fc.features[0].properties.is_empty());
    }

    #[test]
    fn non_point_geometry_has_no_point() {
        let fc = collection(json!({
            "features": [
                { "geometry": { "type": "Polygon", "coordinates": [[[4.0, 47.0]]] } },
                { "geometry": { "type": "Point", "coordinates": [4.0] } },
                { "geometry": null }
            ]
        }));
        assert!(fc.features.iter().all(|f| f.point().is_none()));
        assert_eq!(fc.kind, "FeatureCollection");
    }

    #[test]
    fn polygons_join_by_id_then_sub_region() {
        let regions = vec![sub_region("Chablis", 12, Some(420.5)), sub_region("Mâcon-Villages", 3, None)];
        let polygons = collection(json!({
            "type": "FeatureCollection",
            "bbox": [2.9, 46.0, 6.2, 48.5],
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "id": "chablis", "score": 0.9 } },
                { "type": "Feature", "geometry": null, "properties": { "sub_region": "Macon Villages" } },
                { "type": "Feature", "geometry": null, "properties": { "sub_region": "Atlantis", "source": "old" } }
            ]
        }));

        let joined = join_polygons(polygons, &regions, &GeoTuning::default());
        assert_eq!(joined.features.len(), 3);
        assert!(joined.extra.contains_key("bbox"));

        let chablis = &joined.features[0].properties;
        assert_eq!(chablis["sub_region"], json!("Chablis"));
        assert_eq!(chablis["wine_count"], json!(12));
        assert_eq!(chablis["avg_price"], json!(420.5));
        assert_eq!(chablis["score"], json!(0.9));
        assert_eq!(chablis["source"], json!("nominatim_polygon"));

        let macon = &joined.features[1].properties;
        assert_eq!(macon["id"], json!("macon-villages"));
        assert_eq!(macon["sub_region"], json!("Mâcon-Villages"));
        assert_eq!(macon["avg_price"], Value::Null);

        let unmatched = &joined.features[2].properties;
        assert_eq!(unmatched["id"], json!("atlantis"));
        assert_eq!(unmatched["sub_region"], json!("Atlantis"));
        assert_eq!(unmatched["wine_count"], Value::Null);
        assert_eq!(unmatched["producer_count"], Value::Null);
        assert_eq!(unmatched["source"], json!("nominatim_polygon"));
    }

    #[test]
    fn accent_stripped_ids_fall_back_to_sub_region_name() {
        let regions = vec![sub_region("Mâcon-Villages", 7, Some(180.0))];
        let polygons = collection(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": null,
                "properties": { "id": "mcon-villages", "sub_region": "Mâcon-Villages", "source": "nominatim_polygon" }
            }]
        }));

        let joined = join_polygons(polygons, &regions, &GeoTuning::default());
        let macon = &joined.features[0].properties;
        assert_eq!(macon["id"], json!("macon-villages"));
        assert_eq!(macon["wine_count"], json!(7));
        assert_eq!(macon["avg_price"], json!(180.0));
    }

    #[test]
    fn unmatched_polygon_keeps_its_own_id_slug() {
        let polygons = collection(json!({
            "features": [{ "geometry": null, "properties": { "id": "Irancy", "sub_region": "Irancy AOC" } }]
        }));
        let joined = join_polygons(polygons, &[], &GeoTuning::default());
        let irancy = &joined.features[0].properties;
        assert_eq!(irancy["id"], json!("irancy"));
        assert_eq!(irancy["wine_count"], Value::Null);
    }
}
