use crate::types::{DevelopmentInfo, PipelineError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// The hand-maintained reference → development lookup table, supplied as a
/// JSON document keyed by property reference.
///
/// Most feed references have no entry; a miss is the expected common case
/// and returns `None`, never an error.
pub struct MappingTable {
    entries: HashMap<String, DevelopmentInfo>,
    /// Uppercased-reference index for the case-normalized retry.
    upper_index: HashMap<String, String>,
}

impl MappingTable {
    pub fn from_entries(entries: HashMap<String, DevelopmentInfo>) -> Self {
        let upper_index = entries
            .keys()
            .map(|k| (k.to_uppercase(), k.clone()))
            .collect();
        Self {
            entries,
            upper_index,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "cannot read mapping table {}: {}",
                path.display(),
                e
            ))
        })?;
        let entries: HashMap<String, DevelopmentInfo> = serde_json::from_str(&raw)?;
        info!(
            "Loaded mapping table with {} references from {}",
            entries.len(),
            path.display()
        );
        Ok(Self::from_entries(entries))
    }

    /// Exact-match lookup with a case-normalized retry.
    pub fn lookup(&self, reference: &str) -> Option<&DevelopmentInfo> {
        if let Some(info) = self.entries.get(reference) {
            return Some(info);
        }
        self.upper_index
            .get(&reference.to_uppercase())
            .and_then(|original| self.entries.get(original))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
