//! Class registry and label encoding
//!
//! Class names are sorted lexicographically before codes are assigned, so
//! the same set of labels always encodes the same way regardless of the
//! order rows appear in the metadata file.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::sample::{ImageRecord, Sample, SampleTable};

/// Bijection between class names and codes `0..n`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ClassRegistry {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl From<Vec<String>> for ClassRegistry {
    fn from(names: Vec<String>) -> Self {
        Self::from_sorted(names)
    }
}

impl From<ClassRegistry> for Vec<String> {
    fn from(registry: ClassRegistry) -> Self {
        registry.names
    }
}

impl ClassRegistry {
    /// Build a registry from any collection of label strings
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        Self::from_sorted(distinct.into_iter().collect())
    }

    fn from_sorted(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code))
            .collect();
        Self { names, index }
    }

    pub fn code_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn name_of(&self, code: usize) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class names in code order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// A new registry holding only the given codes, renumbered densely
    ///
    /// Relative order is kept, so the result is still sorted. Codes that are
    /// out of range are ignored.
    pub fn restricted_to(&self, codes: &BTreeSet<usize>) -> ClassRegistry {
        let names = codes
            .iter()
            .filter_map(|&code| self.names.get(code).cloned())
            .collect();
        Self::from_sorted(names)
    }

    /// Re-encode a table produced by `self` into the codes of `target`
    ///
    /// Samples whose class is absent from `target` are dropped.
    pub fn reencode(&self, table: SampleTable, target: &ClassRegistry) -> SampleTable {
        table
            .into_inner()
            .into_iter()
            .filter_map(|mut sample| {
                let name = self.name_of(sample.label)?;
                sample.label = target.code_of(name)?;
                Some(sample)
            })
            .collect()
    }
}

/// Assign integer labels to image records
pub fn encode_labels(records: Vec<ImageRecord>) -> (SampleTable, ClassRegistry) {
    let registry = ClassRegistry::from_labels(records.iter().map(|r| r.raw_label.as_str()));

    let table: SampleTable = records
        .into_iter()
        .filter_map(|r| {
            let label = registry.code_of(&r.raw_label)?;
            Some(Sample {
                id: r.id,
                raw_label: r.raw_label,
                image_path: r.image_path,
                label,
            })
        })
        .collect();

    info!(
        "Encoded {} samples into {} classes",
        table.len(),
        registry.len()
    );

    (table, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn records(labels: &[&str]) -> Vec<ImageRecord> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| ImageRecord {
                id: i as u64,
                raw_label: l.to_string(),
                image_path: PathBuf::from(format!("{}.jpg", i)),
            })
            .collect()
    }

    #[test]
    fn test_codes_follow_sorted_names() {
        let (table, registry) = encode_labels(records(&["Watches", "Bags", "Shirts", "Bags"]));

        assert_eq!(registry.names(), &["Bags", "Shirts", "Watches"]);
        let labels: Vec<usize> = table.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![2, 0, 1, 0]);
    }

    #[test]
    fn test_encoding_independent_of_row_order() {
        let (_, a) = encode_labels(records(&["Tshirts", "Heels", "Belts"]));
        let (_, b) = encode_labels(records(&["Belts", "Tshirts", "Heels"]));
        assert_eq!(a.names(), b.names());
        assert_eq!(a.code_of("Heels"), b.code_of("Heels"));
    }

    #[test]
    fn test_round_trip_lookup() {
        let registry = ClassRegistry::from_labels(["Jeans", "Flats"]);
        for (code, name) in registry.names().iter().enumerate() {
            assert_eq!(registry.code_of(name), Some(code));
            assert_eq!(registry.name_of(code), Some(name.as_str()));
        }
        assert_eq!(registry.name_of(5), None);
        assert_eq!(registry.code_of("Sarees"), None);
    }

    #[test]
    fn test_serde_rebuilds_index() {
        let registry = ClassRegistry::from_labels(["Kurtas", "Caps"]);
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"["Caps","Kurtas"]"#);

        let restored: ClassRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.code_of("Kurtas"), Some(1));
    }

    #[test]
    fn test_restricted_to_renumbers() {
        let registry = ClassRegistry::from_labels(["A", "B", "C", "D"]);
        let kept: BTreeSet<usize> = [1, 3, 9].into_iter().collect();
        let compact = registry.restricted_to(&kept);

        assert_eq!(compact.names(), &["B", "D"]);
        assert_eq!(compact.code_of("D"), Some(1));
    }

    #[test]
    fn test_reencode_drops_unknown_classes() {
        let (table, registry) = encode_labels(records(&["A", "B", "C", "B"]));
        let kept: BTreeSet<usize> = [1, 2].into_iter().collect();
        let compact = registry.restricted_to(&kept);

        let reencoded = registry.reencode(table, &compact);
        let pairs: Vec<(String, usize)> = reencoded
            .iter()
            .map(|s| (s.raw_label.clone(), s.label))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("B".to_string(), 0),
                ("C".to_string(), 1),
                ("B".to_string(), 0)
            ]
        );
    }
}
