//! Row filters applied between loading and export
//!
//! - Existence: drop rows whose image file is missing
//! - Class count: drop classes with too few samples to stratify
//! - Consistency: drop classes that ended up in only one split

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::metadata::MetadataRecord;
use super::sample::{ImageRecord, SampleTable};
use super::split::DatasetSplit;

/// Rule mapping an image id to its expected file path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLocator {
    /// Directory holding `<id>.<extension>` files
    pub images_dir: PathBuf,
    /// Extension without the leading dot
    pub extension: String,
}

impl ImageLocator {
    pub fn new(images_dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            images_dir: images_dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn path_for(&self, id: u64) -> PathBuf {
        self.images_dir.join(format!("{}.{}", id, self.extension))
    }
}

/// Keep only records whose image file exists
pub fn filter_existing(records: Vec<MetadataRecord>, locator: &ImageLocator) -> Vec<ImageRecord> {
    let total = records.len();

    let kept: Vec<ImageRecord> = records
        .into_iter()
        .filter_map(|record| {
            let image_path = locator.path_for(record.id);
            if is_file(&image_path) {
                Some(ImageRecord {
                    id: record.id,
                    raw_label: record.raw_label,
                    image_path,
                })
            } else {
                debug!("Image missing for id {}: {:?}", record.id, image_path);
                None
            }
        })
        .collect();

    let missing = total - kept.len();
    if missing > 0 {
        warn!("{} of {} metadata rows have no image file", missing, total);
    }
    info!("{} records with images on disk", kept.len());

    kept
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

/// Keep only rows whose label occurs at least `min_count` times
///
/// Returns the filtered table and the label codes that were dropped.
pub fn filter_min_class_count(
    mut table: SampleTable,
    min_count: usize,
) -> (SampleTable, BTreeSet<usize>) {
    let counts = table.label_counts();
    let dropped: BTreeSet<usize> = counts
        .iter()
        .filter(|(_, &n)| n < min_count)
        .map(|(&label, _)| label)
        .collect();

    if !dropped.is_empty() {
        table.retain(|s| !dropped.contains(&s.label));
        warn!(
            "Dropped {} classes with fewer than {} samples",
            dropped.len(),
            min_count
        );
    }

    (table, dropped)
}

/// Drop classes that are not present in both splits
///
/// Returns the pruned split and the label codes that were dropped.
pub fn filter_consistent_labels(mut split: DatasetSplit) -> (DatasetSplit, BTreeSet<usize>) {
    let train_labels = split.train.label_set();
    let val_labels = split.val.label_set();

    let shared: BTreeSet<usize> = train_labels.intersection(&val_labels).copied().collect();
    let dropped: BTreeSet<usize> = train_labels
        .union(&val_labels)
        .filter(|l| !shared.contains(l))
        .copied()
        .collect();

    if !dropped.is_empty() {
        split.train.retain(|s| shared.contains(&s.label));
        split.val.retain(|s| shared.contains(&s.label));
        warn!(
            "Dropped {} classes missing from one of the splits",
            dropped.len()
        );
    }
    info!("{} classes present in both splits", shared.len());

    (split, dropped)
}
