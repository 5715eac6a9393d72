//! Files written next to the materialized dataset

pub mod dataset_file;
pub mod manifest;

pub use dataset_file::{DatasetFile, DATASET_FILE_NAME};
pub use manifest::{ManifestEntry, SplitManifest, MANIFEST_FILE_NAME};
