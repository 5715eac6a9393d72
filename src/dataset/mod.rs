//! Dataset module for product-image metadata handling
//!
//! This module provides functionality for:
//! - Loading the metadata table and resolving image files
//! - Encoding category labels into a stable class registry
//! - Stratified train/validation splitting with class pruning
//! - Exporting splits as class folders or in-memory batches
//!
//! ## Pipeline Order
//!
//! 1. `metadata::load_metadata` - parse rows, skip malformed ones
//! 2. `filter::filter_existing` - drop rows without an image file
//! 3. `registry::encode_labels` - sorted class names to codes
//! 4. `filter::filter_min_class_count` - drop rare classes
//! 5. `split::stratified_split` - seeded per-class split
//! 6. `filter::filter_consistent_labels` - keep classes present in both splits

pub mod batches;
pub mod filter;
pub mod materialize;
pub mod metadata;
pub mod registry;
pub mod sample;
pub mod split;
pub mod stats;

// Re-export main types for convenience
pub use batches::{Batch, SampleBatches};
pub use filter::{filter_consistent_labels, filter_existing, filter_min_class_count, ImageLocator};
pub use materialize::{
    class_dir_name, class_dir_names, materialize_split, CopyMode, MaterializeReport,
};
pub use metadata::{load_metadata, LoadReport, MetadataColumns, MetadataRecord};
pub use registry::{encode_labels, ClassRegistry};
pub use sample::{ImageRecord, Sample, SampleTable};
pub use split::{stratified_split, DatasetSplit, SplitConfig};
pub use stats::ClassDistribution;

/// Directory name of the training split
pub const TRAIN_DIR: &str = "train";

/// Directory name of the validation split
pub const VAL_DIR: &str = "val";
