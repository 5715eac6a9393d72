//! End-to-end preparation pipeline
//!
//! Runs the stages in order and collects per-stage counts. Any stage error
//! aborts the run; malformed rows and missing images are not errors.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{OutputConfig, PipelineConfig};
use crate::dataset::{
    class_dir_names, encode_labels, filter_consistent_labels, filter_existing,
    filter_min_class_count, load_metadata, materialize_split, stratified_split, ClassRegistry, DatasetSplit,
    MaterializeReport, TRAIN_DIR, VAL_DIR,
};
use crate::export::{DatasetFile, SplitManifest, DATASET_FILE_NAME, MANIFEST_FILE_NAME};
use crate::utils::error::{PrepError, Result};
use crate::utils::percent;

/// Counts collected while the pipeline runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicate_ids: usize,
    pub missing_images: usize,
    pub classes_encoded: usize,
    pub rare_classes_dropped: usize,
    pub inconsistent_classes_dropped: usize,
    pub train_len: usize,
    pub val_len: usize,
}

impl PipelineReport {
    pub fn final_classes(&self) -> usize {
        self.classes_encoded - self.rare_classes_dropped - self.inconsistent_classes_dropped
    }
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.train_len + self.val_len;
        writeln!(f, "Pipeline Summary:")?;
        writeln!(f, "  Metadata rows: {}", self.rows_read)?;
        writeln!(f, "  Malformed rows skipped: {}", self.rows_skipped)?;
        writeln!(f, "  Repeated ids ignored: {}", self.duplicate_ids)?;
        writeln!(f, "  Rows without image: {}", self.missing_images)?;
        writeln!(f, "  Classes encoded: {}", self.classes_encoded)?;
        writeln!(f, "  Rare classes dropped: {}", self.rare_classes_dropped)?;
        writeln!(
            f,
            "  Classes missing from a split: {}",
            self.inconsistent_classes_dropped
        )?;
        writeln!(f, "  Final classes: {}", self.final_classes())?;
        writeln!(
            f,
            "  Train: {} ({:.1}%)",
            self.train_len,
            percent(self.train_len, total)
        )?;
        writeln!(
            f,
            "  Val: {} ({:.1}%)",
            self.val_len,
            percent(self.val_len, total)
        )
    }
}

/// Pipeline output ready for training or export
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// Splits with labels encoded against `registry`
    pub split: DatasetSplit,
    /// Dense registry over the classes that survived every filter
    pub registry: ClassRegistry,
    pub report: PipelineReport,
    config: PipelineConfig,
}

/// What `write_outputs` produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputReport {
    pub train: MaterializeReport,
    pub val: MaterializeReport,
}

impl PreparedDataset {
    /// Materialize both splits and write the dataset description files
    pub fn write_outputs(&self, output: &OutputConfig) -> Result<OutputReport> {
        class_dir_names(self.registry.names().iter().map(String::as_str))?;
        fs::create_dir_all(&output.root)?;

        let train = materialize_split(&self.split.train, &output.root, TRAIN_DIR, output.copy_mode)?;
        let val = materialize_split(&self.split.val, &output.root, VAL_DIR, output.copy_mode)?;

        if output.write_dataset_file {
            let root = output.root.canonicalize()?;
            DatasetFile::from_registry(&root, &self.registry)?
                .write(&output.root.join(DATASET_FILE_NAME))?;
        }

        if output.write_manifest {
            SplitManifest::new(&self.split, &self.registry, &self.config.split)
                .save(&output.root.join(MANIFEST_FILE_NAME))?;
        }

        Ok(OutputReport { train, val })
    }
}

/// Stage runner over a validated configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run loading, filtering, encoding and splitting
    pub fn run(&self) -> Result<PreparedDataset> {
        let config = &self.config;
        let mut report = PipelineReport::default();

        let (records, load) = load_metadata(&config.source.metadata_path, &config.columns)?;
        report.rows_read = load.rows_read;
        report.rows_skipped = load.rows_skipped;
        report.duplicate_ids = load.duplicate_ids;

        let loaded = records.len();
        let images = filter_existing(records, &config.source.locator());
        report.missing_images = loaded - images.len();

        if images.is_empty() {
            return Err(PrepError::Dataset(format!(
                "No metadata rows have an image in {:?}",
                config.source.images_dir
            )));
        }

        let (table, registry) = encode_labels(images);
        report.classes_encoded = registry.len();

        let (table, rare) = filter_min_class_count(table, config.split.min_samples_per_class);
        report.rare_classes_dropped = rare.len();

        let split = stratified_split(table, config.split.val_fraction, config.split.seed)?;
        let (split, inconsistent) = filter_consistent_labels(split);
        report.inconsistent_classes_dropped = inconsistent.len();

        let compact = registry.restricted_to(&split.train.label_set());
        let split = DatasetSplit {
            train: registry.reencode(split.train, &compact),
            val: registry.reencode(split.val, &compact),
        };
        report.train_len = split.train.len();
        report.val_len = split.val.len();

        if compact.is_empty() {
            return Err(PrepError::Dataset(
                "No class has samples in both training and validation splits".to_string(),
            ));
        }

        info!(
            "Prepared {} classes: {} train / {} val",
            compact.len(),
            report.train_len,
            report.val_len
        );

        Ok(PreparedDataset {
            split,
            registry: compact,
            report,
            config: config.clone(),
        })
    }

    /// Run the pipeline and write every configured output
    pub fn run_and_export(&self) -> Result<(PreparedDataset, OutputReport)> {
        let prepared = self.run()?;
        let outputs = prepared.write_outputs(&self.config.output)?;
        Ok((prepared, outputs))
    }
}
