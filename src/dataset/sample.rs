//! Sample records and the table that carries them through the pipeline

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A metadata row whose image file was found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: u64,
    pub raw_label: String,
    pub image_path: PathBuf,
}

/// A fully resolved sample with its encoded label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Numeric image id from the metadata file
    pub id: u64,
    /// Category label as written in the metadata file
    pub raw_label: String,
    /// Path to the image file
    pub image_path: PathBuf,
    /// Code assigned by the class registry that produced this sample
    pub label: usize,
}

/// Ordered collection of samples
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTable {
    samples: Vec<Sample>,
}

impl SampleTable {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples per label code
    pub fn label_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct label codes present in the table
    pub fn label_set(&self) -> BTreeSet<usize> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Keep only samples matching the predicate, preserving order
    pub fn retain<F: FnMut(&Sample) -> bool>(&mut self, f: F) {
        self.samples.retain(f);
    }

    pub fn into_inner(self) -> Vec<Sample> {
        self.samples
    }
}

impl FromIterator<Sample> for SampleTable {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SampleTable {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a table from (label code, label name) pairs with sequential ids
    pub fn table(labels: &[(usize, &str)]) -> SampleTable {
        labels
            .iter()
            .enumerate()
            .map(|(i, (label, name))| Sample {
                id: i as u64,
                raw_label: name.to_string(),
                image_path: PathBuf::from(format!("images/{}.jpg", i)),
                label: *label,
            })
            .collect()
    }

    /// `per_class` samples for each of `classes` labels, interleaved by class
    pub fn balanced(classes: usize, per_class: usize) -> SampleTable {
        let labels: Vec<(usize, String)> = (0..per_class)
            .flat_map(|_| (0..classes).map(|c| (c, format!("Class_{}", c))))
            .collect();
        let refs: Vec<(usize, &str)> = labels.iter().map(|(c, n)| (*c, n.as_str())).collect();
        table(&refs)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::table;

    #[test]
    fn test_label_counts_and_set() {
        let t = table(&[(0, "A"), (1, "B"), (0, "A"), (2, "C")]);

        let counts = t.label_counts();
        assert_eq!(counts[&0], 2);
        assert_eq!(counts[&1], 1);
        assert_eq!(t.label_set().into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut t = table(&[(0, "A"), (1, "B"), (0, "A"), (1, "B")]);
        t.retain(|s| s.label == 1);

        let ids: Vec<u64> = t.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
