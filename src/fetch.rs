//! Dataset acquisition
//!
//! Fetching is an opaque step: given a destination, a source returns the
//! directory that holds the extracted dataset, or fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::utils::error::{PrepError, Result};

/// Something that can place a dataset on disk
pub trait DatasetSource {
    /// Make the dataset available under `dest` and return its root
    fn fetch(&self, dest: &Path) -> Result<PathBuf>;
}

/// A dataset that is already extracted locally
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    pub path: PathBuf,
}

impl LocalDirSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for LocalDirSource {
    fn fetch(&self, _dest: &Path) -> Result<PathBuf> {
        if !self.path.is_dir() {
            return Err(PrepError::Fetch(format!(
                "Local dataset directory does not exist: {:?}",
                self.path
            )));
        }
        info!("Using local dataset at: {:?}", self.path);
        Ok(self.path.clone())
    }
}

/// Download through the Kaggle command-line client
#[derive(Debug, Clone)]
pub struct KaggleCliSource {
    /// Dataset slug, e.g. `owner/dataset-name`
    pub dataset: String,
    /// Executable to run
    pub cli: PathBuf,
}

impl KaggleCliSource {
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            cli: PathBuf::from("kaggle"),
        }
    }

    pub fn with_cli(mut self, cli: impl Into<PathBuf>) -> Self {
        self.cli = cli.into();
        self
    }

    fn args(&self, dest: &Path) -> Vec<String> {
        vec![
            "datasets".to_string(),
            "download".to_string(),
            "-d".to_string(),
            self.dataset.clone(),
            "-p".to_string(),
            dest.to_string_lossy().to_string(),
            "--unzip".to_string(),
        ]
    }
}

impl DatasetSource for KaggleCliSource {
    fn fetch(&self, dest: &Path) -> Result<PathBuf> {
        if !self.dataset.contains('/') {
            return Err(PrepError::Fetch(format!(
                "Dataset id must look like 'owner/name', got '{}'",
                self.dataset
            )));
        }

        fs::create_dir_all(dest)?;
        info!("Downloading {} to {:?}", self.dataset, dest);

        let output = Command::new(&self.cli)
            .args(self.args(dest))
            .output()
            .map_err(|e| PrepError::Fetch(format!("Failed to run {:?}: {}", self.cli, e)))?;

        if !output.status.success() {
            return Err(PrepError::Fetch(format!(
                "{:?} exited with {}: {}",
                self.cli,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(dest.to_path_buf())
    }
}
