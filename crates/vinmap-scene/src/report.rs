//! Markdown provenance report over a written scene.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use vinmap_core::{GeoBounds, Location};

use crate::scene::Scene;

pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn tally<'a>(locations: impl Iterator<Item = &'a Location>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for loc in locations {
        let key = loc.source.clone().unwrap_or_else(|| "(none)".to_string());
        *counts.entry(key).or_default() += 1;
    }
    counts
}

fn push_tally(lines: &mut Vec<String>, title: &str, counts: &BTreeMap<String, usize>) {
    lines.push(format!("## {title}"));
    if counts.is_empty() {
        lines.push("- none".to_string());
    }
    for (source, n) in counts {
        lines.push(format!("- `{source}`: {n}"));
    }
    lines.push(String::new());
}

pub fn provenance_report_markdown(scene: &Scene, bounds: &GeoBounds) -> String {
    let generated = DateTime::from_timestamp(scene.generated_at_unix, 0)
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| scene.generated_at_unix.to_string());
    let c = &scene.counts;

    let mut lines = vec![
        "# Bourgogne Scene Report".to_string(),
        String::new(),
        format!("- Generated: {generated}"),
        format!("- Wines: {}", c.wines),
        format!("- Producers: {} ({} manual overrides)", c.producers, c.manual_override_producers),
        format!("- Sub-regions: {}", c.sub_regions),
        format!("- Grapes: {}", c.grapes),
        format!("- Producer/grape points: {}", c.producer_grape_points),
        format!("- Sub-region polygons: {}", c.sub_region_polygons),
        String::new(),
    ];

    push_tally(
        &mut lines,
        "Producer location sources",
        &tally(scene.producers.iter().map(|p| &p.location)),
    );
    push_tally(
        &mut lines,
        "Sub-region location sources",
        &tally(scene.sub_regions.iter().map(|s| &s.location)),
    );

    lines.push("## Sub-regions outside bounds".to_string());
    let outside: Vec<&str> = scene
        .sub_regions
        .iter()
        .filter(|s| !s.location.in_bounds(bounds))
        .map(|s| s.name.as_str())
        .collect();
    if outside.is_empty() {
        lines.push("- none".to_string());
    }
    for name in outside {
        lines.push(format!("- {name}"));
    }
    lines.push(String::new());

    let known: BTreeSet<&str> = scene.sub_regions.iter().map(|s| s.id.as_str()).collect();
    let unmatched = scene
        .geojson
        .sub_region_polygons
        .features
        .iter()
        .filter(|f| {
            f.properties
                .get("id")
                .and_then(|v| v.as_str())
                .map_or(true, |id| !known.contains(id))
        })
        .count();
    lines.push(format!("Unmatched polygons: {unmatched}"));

    lines.join("\n")
}
