//! Scene build orchestration: config, input loading, normalization, output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;
use vinmap_core::GeoTuning;
use vinmap_storage::{resolve_source_dir, SceneStore};

pub mod geojson;
pub mod normalize;
pub mod report;
pub mod scene;

pub use report::{load_scene, provenance_report_markdown};
pub use scene::{build_scene, Scene, SceneCounts, SceneInputs};

pub const CRATE_NAME: &str = "vinmap-scene";

#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub workspace_root: PathBuf,
    pub source_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub tuning_file: PathBuf,
}

impl SceneConfig {
    pub fn for_root(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            source_dir: None,
            output_dir: workspace_root.join("public").join("data"),
            tuning_file: workspace_root.join("geo-tuning.yaml"),
            workspace_root,
        }
    }

    pub fn from_env() -> Self {
        let root = std::env::var("VINMAP_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let mut config = Self::for_root(root);
        if let Ok(dir) = std::env::var("VINMAP_SOURCE_DIR") {
            config.source_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("VINMAP_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("VINMAP_TUNING_FILE") {
            config.tuning_file = PathBuf::from(path);
        }
        config
    }

    pub fn resolved_source_dir(&self) -> PathBuf {
        resolve_source_dir(&self.workspace_root, self.source_dir.as_deref())
    }

    pub fn scene_path(&self) -> PathBuf {
        SceneStore::new(&self.output_dir).scene_path()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_dir: String,
    pub counts: SceneCounts,
    pub output_path: Option<String>,
    pub content_hash: Option<String>,
    pub byte_size: Option<usize>,
}

pub struct ScenePipeline {
    config: SceneConfig,
    tuning: GeoTuning,
    store: SceneStore,
}

impl ScenePipeline {
    pub fn new(config: SceneConfig) -> Result<Self> {
        let tuning = GeoTuning::load(&config.tuning_file)
            .with_context(|| format!("loading tuning from {}", config.tuning_file.display()))?;
        let store = SceneStore::new(config.output_dir.clone());
        Ok(Self {
            config,
            tuning,
            store,
        })
    }

    pub fn with_tuning(mut self, tuning: GeoTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Load and normalize everything without touching the output directory.
    pub fn build(&self, generated_at: DateTime<Utc>) -> Result<(PathBuf, Scene)> {
        let source_dir = self.config.resolved_source_dir();
        let inputs = SceneInputs::load(&source_dir)
            .with_context(|| format!("loading scene inputs from {}", source_dir.display()))?;

        let scene = build_scene(inputs, &self.tuning, generated_at.timestamp());
        Ok((source_dir, scene))
    }

    /// Build the scene and write it. Nothing is written if any required input
    /// is missing or invalid.
    pub fn run_once(&self) -> Result<BuildSummary> {
        self.run(true)
    }

    /// Full build in memory, no output written.
    pub fn check(&self) -> Result<BuildSummary> {
        self.run(false)
    }

    fn run(&self, write: bool) -> Result<BuildSummary> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let span = info_span!("scene_build", %run_id);
        let _guard = span.enter();

        let (source_dir, scene) = self.build(started_at)?;
        let counts = scene.counts;

        let stored = if write {
            let bytes = serde_json::to_vec_pretty(&scene).context("serializing scene")?;
            let stored = self.store.write_scene(&bytes)?;
            info!(
                path = %stored.path.display(),
                bytes = stored.byte_size,
                wines = counts.wines,
                producers = counts.producers,
                "wrote scene"
            );
            Some(stored)
        } else {
            info!(wines = counts.wines, producers = counts.producers, "scene check passed");
            None
        };

        Ok(BuildSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            source_dir: source_dir.display().to_string(),
            counts,
            output_path: stored.as_ref().map(|s| s.path.display().to_string()),
            content_hash: stored.as_ref().map(|s| s.content_hash.clone()),
            byte_size: stored.as_ref().map(|s| s.byte_size),
        })
    }
}

/// Markdown report for the scene at `scene_path`, judged against the bounds
/// from `tuning_file` (defaults when the file is absent).
pub fn report_markdown(scene_path: &Path, tuning_file: &Path) -> Result<String> {
    let tuning = GeoTuning::load(tuning_file)
        .with_context(|| format!("loading tuning from {}", tuning_file.display()))?;
    let scene = load_scene(scene_path)?;
    Ok(provenance_report_markdown(&scene, &tuning.bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_layout() {
        let config = SceneConfig::for_root("/srv/map");
        assert_eq!(config.output_dir, PathBuf::from("/srv/map/public/data"));
        assert_eq!(config.tuning_file, PathBuf::from("/srv/map/geo-tuning.yaml"));
        assert_eq!(
            config.scene_path(),
            PathBuf::from("/srv/map/public/data/bourgogne-scene.json")
        );
        assert!(config.source_dir.is_none());
    }

    #[test]
    fn missing_required_input_writes_nothing() {
        let root = tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join("data")).expect("mkdir");
        let config = SceneConfig::for_root(root.path());
        let pipeline = ScenePipeline::new(config.clone()).expect("pipeline");

        let err = pipeline.run_once().expect_err("missing inputs");
        assert!(format!("{err:#}").contains("bourgogne-wines.enriched.json"));
        assert!(!config.scene_path().exists());
    }
}
