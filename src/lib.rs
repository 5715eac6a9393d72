//! # Product Image Dataset Preparation
//!
//! Turns a product metadata table plus a folder of images into clean,
//! reproducible train/validation splits for image classification.
//!
//! ## Modules
//!
//! - `dataset`: Metadata loading, filtering, label encoding, splitting and export
//! - `export`: `data.yaml` and split manifest writers
//! - `fetch`: Dataset acquisition behind the `DatasetSource` trait
//! - `pipeline`: Runs all stages from one `PipelineConfig`
//! - `config`: TOML-backed configuration
//! - `utils`: Logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use product_prep::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::load("prep.toml".as_ref())?;
//! let (prepared, _) = Pipeline::new(config)?.run_and_export()?;
//! println!("{}", prepared.report);
//! ```

pub mod config;
pub mod dataset;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{OutputConfig, PipelineConfig, SourceConfig};
pub use dataset::{ClassRegistry, DatasetSplit, Sample, SampleBatches, SampleTable, SplitConfig};
pub use export::{DatasetFile, SplitManifest};
pub use fetch::{DatasetSource, KaggleCliSource, LocalDirSource};
pub use pipeline::{Pipeline, PipelineReport, PreparedDataset};
pub use utils::error::{PrepError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
