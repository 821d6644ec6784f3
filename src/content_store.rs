use crate::types::{EntityKind, PipelineError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Idempotent on-disk artifact cache: one pretty-printed JSON file per
/// entity slug, partitioned into a directory per entity kind.
///
/// `exists` is the skip gate that keeps re-runs from paying for model calls
/// already made. `save` writes to a temporary sibling and renames it into
/// place, so a crash mid-write never leaves a partial artifact.
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open (and create) the store under `root`.
    pub fn new(root: &Path) -> Result<Self> {
        for kind in [
            EntityKind::Property,
            EntityKind::Area,
            EntityKind::Developer,
            EntityKind::Development,
        ] {
            fs::create_dir_all(root.join(kind.dir_name())).map_err(|e| {
                PipelineError::Config(format!(
                    "cannot create content directory {}: {}",
                    root.join(kind.dir_name()).display(),
                    e
                ))
            })?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn artifact_path(&self, kind: EntityKind, slug: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(format!("{}.json", slug))
    }

    pub fn exists(&self, kind: EntityKind, slug: &str) -> bool {
        self.artifact_path(kind, slug).is_file()
    }

    pub fn save(&self, kind: EntityKind, slug: &str, content: &Value) -> Result<()> {
        let path = self.artifact_path(kind, slug);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(content)?;

        fs::write(&tmp, body).map_err(|e| PipelineError::Persistence {
            slug: slug.to_string(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| PipelineError::Persistence {
            slug: slug.to_string(),
            source: e,
        })?;

        debug!("Saved {} artifact '{}'", kind, slug);
        Ok(())
    }

    pub fn load(&self, kind: EntityKind, slug: &str) -> Result<Value> {
        let raw = fs::read_to_string(self.artifact_path(kind, slug))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
