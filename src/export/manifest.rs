//! Split manifest
//!
//! Records exactly which sample went where, together with the settings that
//! produced the split, so a run can be audited or reproduced.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{ClassRegistry, DatasetSplit, SampleTable, SplitConfig};
use crate::utils::error::Result;

/// Default file name for the manifest
pub const MANIFEST_FILE_NAME: &str = "split_manifest.json";

/// One sample as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: u64,
    pub label: usize,
    pub class_name: String,
    pub image_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitManifest {
    /// Settings used to build the split
    pub config: SplitConfig,
    /// Class names in code order
    pub classes: ClassRegistry,
    pub train: Vec<ManifestEntry>,
    pub val: Vec<ManifestEntry>,
}

impl SplitManifest {
    pub fn new(split: &DatasetSplit, registry: &ClassRegistry, config: &SplitConfig) -> Self {
        Self {
            config: config.clone(),
            classes: registry.clone(),
            train: entries(&split.train),
            val: entries(&split.val),
        }
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn entries(table: &SampleTable) -> Vec<ManifestEntry> {
    table
        .iter()
        .map(|s| ManifestEntry {
            id: s.id,
            label: s.label,
            class_name: s.raw_label.clone(),
            image_path: s.image_path.clone(),
        })
        .collect()
}
