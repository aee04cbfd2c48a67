//! Source document loading and atomic scene output for the wine map.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "vinmap-storage";

pub const WINES_FILE: &str = "bourgogne-wines.enriched.json";
pub const PRODUCERS_FILE: &str = "bourgogne-producers.enriched.json";
pub const SUB_REGIONS_FILE: &str = "bourgogne-subregions.enriched.json";
pub const GRAPES_FILE: &str = "bourgogne-grapes.enriched.json";
pub const PRODUCER_GRAPE_POINTS_FILE: &str = "bourgogne-producer-grape-points.geojson";
pub const PRODUCER_POINTS_FILE: &str = "bourgogne-producers.geojson";
pub const SUB_REGION_POINTS_FILE: &str = "bourgogne-subregions.geojson";
pub const SUB_REGION_POLYGONS_FILE: &str = "bourgogne-subregions.polygons.geojson";
pub const OVERRIDES_FILE: &str = "producer-coordinate-overrides.json";
pub const SCENE_FILE: &str = "bourgogne-scene.json";

/// Directories searched, relative to the workspace root, when no source
/// directory is configured explicitly.
pub const SOURCE_DIR_CANDIDATES: [&str; 2] = ["data", "public/data"];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("required input missing: {path}")]
    Missing { path: String },
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl InputError {
    pub fn path(&self) -> &str {
        match self {
            Self::Missing { path } | Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Pick the directory holding the enriched inputs.
///
/// An explicit directory is used as-is. Otherwise the first existing
/// candidate under `workspace_root` wins; when none exist the first
/// candidate is returned so the missing-input error names a real path.
pub fn resolve_source_dir(workspace_root: &Path, explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    let candidates: Vec<PathBuf> = SOURCE_DIR_CANDIDATES
        .iter()
        .map(|c| workspace_root.join(c))
        .collect();
    match candidates.iter().find(|c| c.is_dir()) {
        Some(found) => found.clone(),
        None => {
            warn!(
                root = %workspace_root.display(),
                "no source directory candidate exists; defaulting to {}",
                candidates[0].display()
            );
            candidates[0].clone()
        }
    }
}

/// Read and parse a document that must exist.
pub fn load_required<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, InputError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    if !path.is_file() {
        return Err(InputError::Missing { path: display });
    }
    let data = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| InputError::Parse {
        path: display,
        source,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalStatus {
    Loaded,
    Missing,
    Malformed,
}

#[derive(Debug, Clone)]
pub struct OptionalDocument<T> {
    pub value: T,
    pub status: OptionalStatus,
}

/// Read a document that may be absent. Missing or malformed files fall back
/// to `T::default()`; only a malformed file is worth a warning.
pub fn load_optional<T: DeserializeOwned + Default>(path: impl AsRef<Path>) -> OptionalDocument<T> {
    let path = path.as_ref();
    match load_required(path) {
        Ok(value) => OptionalDocument {
            value,
            status: OptionalStatus::Loaded,
        },
        Err(InputError::Missing { .. }) => {
            debug!(path = %path.display(), "optional input absent; using default");
            OptionalDocument {
                value: T::default(),
                status: OptionalStatus::Missing,
            }
        }
        Err(err) => {
            warn!(error = %err, "optional input unusable; using default");
            OptionalDocument {
                value: T::default(),
                status: OptionalStatus::Malformed,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredScene {
    pub path: PathBuf,
    pub content_hash: String,
    pub byte_size: usize,
}

#[derive(Debug, Clone)]
pub struct SceneStore {
    output_dir: PathBuf,
}

impl SceneStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn scene_path(&self) -> PathBuf {
        self.output_dir.join(SCENE_FILE)
    }

    pub fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Write the scene through a temp file in the output directory and rename
    /// it into place, so readers never observe a half-written scene.
    pub fn write_scene(&self, bytes: &[u8]) -> anyhow::Result<StoredScene> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating output directory {}", self.output_dir.display()))?;

        let path = self.scene_path();
        let temp_path = self
            .output_dir
            .join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));

        let written = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.flush()?;
                file.sync_all()
            });
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err).with_context(|| format!("writing temp scene file {}", temp_path.display()));
        }

        if let Err(err) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err).with_context(|| {
                format!(
                    "atomically renaming temp scene {} -> {}",
                    temp_path.display(),
                    path.display()
                )
            });
        }

        Ok(StoredScene {
            path,
            content_hash: Self::sha256_hex(bytes),
            byte_size: bytes.len(),
        })
    }
}
