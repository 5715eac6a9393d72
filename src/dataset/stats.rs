//! Per-class distribution summaries

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::registry::ClassRegistry;
use super::sample::SampleTable;
use crate::utils::error::{PrepError, Result};

/// Sample count per class name, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub counts: BTreeMap<String, usize>,
}

impl ClassDistribution {
    /// Count samples per class in an encoded table
    pub fn from_table(table: &SampleTable, registry: &ClassRegistry) -> Self {
        let counts = table
            .label_counts()
            .into_iter()
            .map(|(code, n)| {
                let name = registry
                    .name_of(code)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("#{}", code));
                (name, n)
            })
            .collect();
        Self { counts }
    }

    /// Count files per class folder under a materialized split directory
    ///
    /// Expects `dir/<class>/<files>`; files directly under `dir` are ignored.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(PrepError::Dataset(format!(
                "Split directory does not exist: {:?}",
                dir
            )));
        }

        let mut counts = BTreeMap::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
        {
            let class_name = entry.file_name().to_string_lossy().to_string();
            let n = WalkDir::new(entry.path())
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .count();
            counts.insert(class_name, n);
        }

        Ok(Self { counts })
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    /// Largest over smallest class size
    pub fn imbalance_ratio(&self) -> f64 {
        let min = self.counts.values().copied().min().unwrap_or(0);
        let max = self.counts.values().copied().max().unwrap_or(0);
        if min == 0 {
            f64::INFINITY
        } else {
            max as f64 / min as f64
        }
    }
}

impl std::fmt::Display for ClassDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.total();
        writeln!(f, "  Total samples: {}", crate::utils::format_number(total))?;
        writeln!(f, "  Number of classes: {}", self.num_classes())?;

        for (idx, (name, count)) in self.counts.iter().enumerate() {
            let bar_len = (crate::utils::percent(*count, total) * 0.4) as usize;
            writeln!(
                f,
                "    {:3}. {:30} {:6} {}",
                idx,
                name,
                count,
                "█".repeat(bar_len)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample::fixtures::table;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_table_uses_registry_names() {
        let registry = ClassRegistry::from_labels(["A", "B"]);
        let dist = ClassDistribution::from_table(&table(&[(0, "A"), (1, "B"), (1, "B")]), &registry);

        assert_eq!(dist.counts["A"], 1);
        assert_eq!(dist.counts["B"], 2);
        assert_eq!(dist.total(), 3);
        assert_eq!(dist.imbalance_ratio(), 2.0);
    }

    #[test]
    fn test_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Shirts")).unwrap();
        fs::create_dir_all(dir.path().join("Watches")).unwrap();
        fs::write(dir.path().join("Shirts/1.jpg"), b"x").unwrap();
        fs::write(dir.path().join("Shirts/2.jpg"), b"x").unwrap();
        fs::write(dir.path().join("Watches/3.jpg"), b"x").unwrap();
        fs::write(dir.path().join("stray.txt"), b"x").unwrap();

        let dist = ClassDistribution::from_directory(dir.path()).unwrap();
        assert_eq!(dist.num_classes(), 2);
        assert_eq!(dist.counts["Shirts"], 2);
        assert_eq!(dist.counts["Watches"], 1);
    }

    #[test]
    fn test_from_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(ClassDistribution::from_directory(&dir.path().join("val")).is_err());
    }

    #[test]
    fn test_display_lists_classes() {
        let registry = ClassRegistry::from_labels(["Caps"]);
        let dist = ClassDistribution::from_table(&table(&[(0, "Caps")]), &registry);
        let text = dist.to_string();
        assert!(text.contains("Caps"));
        assert!(text.contains("Number of classes: 1"));
    }
}
