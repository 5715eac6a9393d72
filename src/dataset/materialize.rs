//! Class-folder materialization
//!
//! Copies each sample's image into `<root>/<split>/<class>/<file name>`,
//! the layout expected by folder-based classification trainers.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::sample::SampleTable;
use crate::utils::error::{PrepError, Result, ResultExt};
use crate::utils::logging::ProgressLogger;

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyMode {
    /// Always copy, replacing existing files
    #[default]
    Overwrite,
    /// Leave existing destination files untouched
    SkipExisting,
}

/// Outcome of materializing one split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeReport {
    pub copied: usize,
    pub skipped: usize,
}

/// Directory name used for a class label
///
/// Separators and parent references are replaced so the class folder always
/// stays directly under the split directory.
pub fn class_dir_name(raw_label: &str) -> String {
    let replaced: String = raw_label
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    match replaced.trim() {
        "" | "." | ".." => "_".to_string(),
        name => name.to_string(),
    }
}

/// Folder names for a set of class labels, in input order
///
/// Fails when two distinct labels sanitize to the same folder, since their
/// images would otherwise be merged into one class on disk.
pub fn class_dir_names<'a, I>(labels: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    let mut names = Vec::new();

    for label in labels {
        let dir = class_dir_name(label);
        let owner = *owners.entry(dir.clone()).or_insert(label);
        if owner != label {
            return Err(PrepError::Dataset(format!(
                "Classes '{}' and '{}' both map to folder '{}'",
                owner, label, dir
            )));
        }
        names.push(dir);
    }

    Ok(names)
}

/// Destination path of one image inside the class-folder tree
pub fn destination_for(root: &Path, split_name: &str, raw_label: &str, src: &Path) -> Result<PathBuf> {
    let file_name = src
        .file_name()
        .with_context(|| format!("Image path has no file name: {:?}", src))?;

    Ok(root
        .join(split_name)
        .join(class_dir_name(raw_label))
        .join(file_name))
}

/// Copy every image of a split into its class folder
pub fn materialize_split(
    table: &SampleTable,
    root: &Path,
    split_name: &str,
    mode: CopyMode,
) -> Result<MaterializeReport> {
    if Path::new(split_name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(PrepError::InvalidInput(format!(
            "Split name must be a plain directory name: {:?}",
            split_name
        )));
    }

    let labels: BTreeSet<&str> = table.iter().map(|s| s.raw_label.as_str()).collect();
    class_dir_names(labels)?;

    info!(
        "Materializing {} images into {:?}",
        table.len(),
        root.join(split_name)
    );

    let mut report = MaterializeReport::default();
    let mut progress = ProgressLogger::new(&format!("Copy {}", split_name), table.len());

    for sample in table {
        let dst = destination_for(root, split_name, &sample.raw_label, &sample.image_path)?;

        if mode == CopyMode::SkipExisting && dst.exists() {
            debug!("Keeping existing {:?}", dst);
            report.skipped += 1;
        } else {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&sample.image_path, &dst).map_err(|source| PrepError::Copy {
                src: sample.image_path.clone(),
                dst: dst.clone(),
                source,
            })?;
            report.copied += 1;
        }

        progress.increment();
    }
    progress.finish();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample::Sample;
    use tempfile::TempDir;

    fn sample(dir: &Path, id: u64, label: &str, code: usize) -> Sample {
        let image_path = dir.join(format!("{}.jpg", id));
        fs::write(&image_path, format!("image-{}", id)).unwrap();
        Sample {
            id,
            raw_label: label.to_string(),
            image_path,
            label: code,
        }
    }

    #[test]
    fn test_class_dir_name() {
        assert_eq!(class_dir_name("Tshirts"), "Tshirts");
        assert_eq!(class_dir_name("Lip Liner"), "Lip Liner");
        assert_eq!(class_dir_name("Shoe/Accessories"), "Shoe_Accessories");
        assert_eq!(class_dir_name(".."), "_");
    }

    #[test]
    fn test_class_dir_names_detects_collisions() {
        let names = class_dir_names(["Bags", "Shoe/Accessories", "Bags"]).unwrap();
        assert_eq!(names, vec!["Bags", "Shoe_Accessories", "Bags"]);

        let err = class_dir_names(["A/B", "A_B"]).unwrap_err();
        assert!(matches!(err, PrepError::Dataset(_)));
        assert!(err.to_string().contains("A_B"));
    }

    #[test]
    fn test_colliding_labels_are_not_merged() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = SampleTable::new(vec![
            sample(src.path(), 1, "A/B", 0),
            sample(src.path(), 2, "A_B", 1),
        ]);

        let err = materialize_split(&table, out.path(), "train", CopyMode::Overwrite).unwrap_err();
        assert!(matches!(err, PrepError::Dataset(_)));
        assert!(!out.path().join("train").exists());
    }

    #[test]
    fn test_every_row_lands_in_its_class_folder() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = SampleTable::new(vec![
            sample(src.path(), 1, "Shirts", 0),
            sample(src.path(), 2, "Watches", 1),
            sample(src.path(), 3, "Shirts", 0),
        ]);

        let report = materialize_split(&table, out.path(), "train", CopyMode::Overwrite).unwrap();
        assert_eq!(report.copied, 3);

        for s in &table {
            let expected = out
                .path()
                .join("train")
                .join(&s.raw_label)
                .join(s.image_path.file_name().unwrap());
            assert!(expected.is_file(), "missing {:?}", expected);
        }
    }

    #[test]
    fn test_overwrite_replaces_existing() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = SampleTable::new(vec![sample(src.path(), 9, "Bags", 0)]);

        let dst = out.path().join("val").join("Bags").join("9.jpg");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&dst, "stale").unwrap();

        materialize_split(&table, out.path(), "val", CopyMode::Overwrite).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "image-9");
    }

    #[test]
    fn test_skip_existing_is_idempotent() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let table = SampleTable::new(vec![
            sample(src.path(), 1, "Belts", 0),
            sample(src.path(), 2, "Belts", 0),
        ]);

        let first = materialize_split(&table, out.path(), "train", CopyMode::SkipExisting).unwrap();
        let second = materialize_split(&table, out.path(), "train", CopyMode::SkipExisting).unwrap();

        assert_eq!(first, MaterializeReport { copied: 2, skipped: 0 });
        assert_eq!(second, MaterializeReport { copied: 0, skipped: 2 });
    }

    #[test]
    fn test_unreadable_source_fails() {
        let out = TempDir::new().unwrap();
        let table = SampleTable::new(vec![Sample {
            id: 5,
            raw_label: "Heels".to_string(),
            image_path: out.path().join("gone.jpg"),
            label: 0,
        }]);

        let err = materialize_split(&table, out.path(), "train", CopyMode::Overwrite).unwrap_err();
        assert!(matches!(err, PrepError::Copy { .. }));
    }

    #[test]
    fn test_split_name_must_be_plain() {
        let out = TempDir::new().unwrap();
        let err = materialize_split(&SampleTable::default(), out.path(), "../x", CopyMode::Overwrite)
            .unwrap_err();
        assert!(matches!(err, PrepError::InvalidInput(_)));
    }
}
