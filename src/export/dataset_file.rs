//! `data.yaml` dataset description
//!
//! Folder-based trainers read the dataset root, split directories, class
//! count and the index-to-name table from this file. Names are the class
//! folder names, so index `i` always points at `<split>/<names[i]>`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{class_dir_names, ClassRegistry, TRAIN_DIR, VAL_DIR};
use crate::utils::error::Result;

/// Default file name for the dataset description
pub const DATASET_FILE_NAME: &str = "data.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFile {
    /// Dataset root
    pub path: PathBuf,
    /// Training split directory, relative to `path`
    pub train: String,
    /// Validation split directory, relative to `path`
    pub val: String,
    /// Number of classes
    pub nc: usize,
    /// Class index to class folder name
    pub names: BTreeMap<usize, String>,
}

impl DatasetFile {
    pub fn from_registry(root: &Path, registry: &ClassRegistry) -> Result<Self> {
        let folders = class_dir_names(registry.names().iter().map(String::as_str))?;

        Ok(Self {
            path: root.to_path_buf(),
            train: TRAIN_DIR.to_string(),
            val: VAL_DIR.to_string(),
            nc: folders.len(),
            names: folders.into_iter().enumerate().collect(),
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        info!("Dataset description saved to: {:?}", path);
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
