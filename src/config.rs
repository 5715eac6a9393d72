//! Pipeline configuration
//!
//! Every path, column name and random seed the pipeline uses lives here, so
//! no stage depends on the working directory or on ambient state. Values
//! can be loaded from TOML and overridden from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{CopyMode, ImageLocator, MetadataColumns, SplitConfig};
use crate::utils::error::{PrepError, Result};

/// Where the raw dataset lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Delimited metadata file
    pub metadata_path: PathBuf,
    /// Directory of `<id>.<ext>` images
    pub images_dir: PathBuf,
    /// Image file extension
    pub image_extension: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            metadata_path: PathBuf::from("data/raw/styles.csv"),
            images_dir: PathBuf::from("data/raw/images"),
            image_extension: "jpg".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn locator(&self) -> ImageLocator {
        ImageLocator::new(&self.images_dir, &self.image_extension)
    }
}

/// What the pipeline writes and where
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the `train/` and `val/` class-folder trees
    pub root: PathBuf,
    pub copy_mode: CopyMode,
    /// Write `data.yaml` under the root
    pub write_dataset_file: bool,
    /// Write `split_manifest.json` under the root
    pub write_manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/prepared"),
            copy_mode: CopyMode::Overwrite,
            write_dataset_file: true,
            write_manifest: true,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub columns: MetadataColumns,
    pub split: SplitConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load a configuration from a TOML file; missing keys keep defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PrepError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PrepError::Serialization(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;

        if self.source.image_extension.trim_start_matches('.').is_empty() {
            return Err(PrepError::Config(
                "Image extension must not be empty".to_string(),
            ));
        }

        if self.columns.id_column == self.columns.label_column {
            return Err(PrepError::Config(format!(
                "Id and label columns must differ, both are '{}'",
                self.columns.id_column
            )));
        }

        Ok(())
    }
}
