//! Stratified train/validation split
//!
//! Each class is split on its own so the validation share of every class
//! tracks the requested fraction.
//!
//! ## Rounding
//!
//! A class with `n` samples sends `round(n * val_fraction)` of them to
//! validation (half rounds away from zero) and the rest to training. When
//! `n >= 2` and the fraction is positive the count is clamped to
//! `1..=n - 1`, so every such class lands in both splits. With a fraction
//! of 0.2, a class of 10 gives 2/8, a class of 3 gives 1/2 and a class of 2
//! gives 1/1. Only singleton classes (or a zero fraction) leave a class on
//! one side, and the consistency filter removes those afterwards.
//!
//! ## Determinism
//!
//! Classes are visited in ascending label order and every class's indices
//! are shuffled with one `ChaCha8Rng` seeded from the configured seed. Both
//! output tables keep the input's relative row order, so the same seed and
//! input always give identical partitions.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::sample::{Sample, SampleTable};
use crate::utils::error::{PrepError, Result};

/// Configuration for dataset splitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of each class sent to validation
    pub val_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Classes with fewer samples are dropped before splitting
    pub min_samples_per_class: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            val_fraction: 0.2,
            seed: 42,
            min_samples_per_class: 2,
        }
    }
}

impl SplitConfig {
    /// Create a split configuration, validating the fraction
    pub fn new(val_fraction: f64, seed: u64, min_samples_per_class: usize) -> Result<Self> {
        let config = Self {
            val_fraction,
            seed,
            min_samples_per_class,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fraction(self.val_fraction)?;

        if self.min_samples_per_class == 0 {
            return Err(PrepError::Config(
                "Minimum samples per class must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_fraction(val_fraction: f64) -> Result<()> {
    if !(0.0..1.0).contains(&val_fraction) {
        return Err(PrepError::Config(format!(
            "Validation fraction must be in [0.0, 1.0), got {}",
            val_fraction
        )));
    }
    Ok(())
}

/// Training and validation partitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub train: SampleTable,
    pub val: SampleTable,
}

impl DatasetSplit {
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len()
    }
}

/// Number of validation samples for a class of `n`
pub fn validation_count(n: usize, val_fraction: f64) -> usize {
    let rounded = (n as f64 * val_fraction).round() as usize;
    if n >= 2 && val_fraction > 0.0 {
        rounded.clamp(1, n - 1)
    } else {
        rounded.min(n)
    }
}

/// Split a table into stratified training and validation partitions
pub fn stratified_split(table: SampleTable, val_fraction: f64, seed: u64) -> Result<DatasetSplit> {
    validate_fraction(val_fraction)?;

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, sample) in table.iter().enumerate() {
        by_class.entry(sample.label).or_default().push(idx);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut val_indices = HashSet::new();

    for indices in by_class.values_mut() {
        let n_val = validation_count(indices.len(), val_fraction);
        indices.shuffle(&mut rng);
        val_indices.extend(indices.iter().take(n_val).copied());
    }

    let (val, train): (Vec<(usize, Sample)>, Vec<(usize, Sample)>) = table
        .into_inner()
        .into_iter()
        .enumerate()
        .partition(|(idx, _)| val_indices.contains(idx));

    let split = DatasetSplit {
        train: train.into_iter().map(|(_, s)| s).collect(),
        val: val.into_iter().map(|(_, s)| s).collect(),
    };

    info!(
        "Split {} samples: {} train / {} val (seed {})",
        split.total(),
        split.train.len(),
        split.val.len(),
        seed
    );

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample::fixtures::{balanced, table};
    use std::collections::BTreeSet;

    #[test]
    fn test_default_config() {
        let config = SplitConfig::default();
        assert_eq!(config.val_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.min_samples_per_class, 2);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(SplitConfig::new(1.0, 42, 2).is_err());
        assert!(SplitConfig::new(-0.1, 42, 2).is_err());
        assert!(SplitConfig::new(f64::NAN, 42, 2).is_err());
        assert!(SplitConfig::new(0.2, 42, 0).is_err());
        assert!(SplitConfig::new(0.0, 42, 1).is_ok());
    }

    #[test]
    fn test_validation_count_rounding() {
        assert_eq!(validation_count(10, 0.2), 2);
        assert_eq!(validation_count(3, 0.2), 1);
        assert_eq!(validation_count(2, 0.2), 1);
        assert_eq!(validation_count(5, 0.5), 3);
        assert_eq!(validation_count(7, 0.0), 0);
        assert_eq!(validation_count(1, 0.2), 0);
        assert_eq!(validation_count(1, 0.6), 1);
        assert_eq!(validation_count(4, 0.9), 3);
    }

    #[test]
    fn test_ten_by_ten_gives_two_val_per_class() {
        let split = stratified_split(balanced(10, 10), 0.2, 42).unwrap();

        assert_eq!(split.total(), 100);
        let train_counts = split.train.label_counts();
        let val_counts = split.val.label_counts();
        for class in 0..10 {
            assert_eq!(val_counts[&class], 2);
            assert_eq!(train_counts[&class], 8);
        }
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let split = stratified_split(balanced(4, 7), 0.3, 7).unwrap();

        let train_ids: BTreeSet<u64> = split.train.iter().map(|s| s.id).collect();
        let val_ids: BTreeSet<u64> = split.val.iter().map(|s| s.id).collect();
        assert!(train_ids.is_disjoint(&val_ids));
        assert_eq!(train_ids.len() + val_ids.len(), 28);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = stratified_split(balanced(5, 20), 0.2, 1234).unwrap();
        let b = stratified_split(balanced(5, 20), 0.2, 1234).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_changes_membership() {
        let a = stratified_split(balanced(5, 40), 0.2, 1).unwrap();
        let b = stratified_split(balanced(5, 40), 0.2, 2).unwrap();
        assert_eq!(a.val.len(), b.val.len());
        assert_ne!(a.val, b.val);
    }

    #[test]
    fn test_input_order_preserved_within_splits() {
        let split = stratified_split(balanced(3, 10), 0.2, 42).unwrap();
        let ids: Vec<u64> = split.train.iter().map(|s| s.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_class_of_two_lands_in_both_splits() {
        let t = table(&[(0, "A"), (0, "A"), (0, "A"), (0, "A"), (0, "A"), (1, "B"), (1, "B")]);
        let split = stratified_split(t, 0.2, 42).unwrap();

        assert_eq!(split.train.label_counts()[&1], 1);
        assert_eq!(split.val.label_counts()[&1], 1);
        assert_eq!(split.val.label_counts()[&0], 1);
    }

    #[test]
    fn test_singleton_class_lands_in_train_only() {
        let t = table(&[(0, "A"), (0, "A"), (0, "A"), (1, "B")]);
        let split = stratified_split(t, 0.2, 42).unwrap();

        assert_eq!(split.val.label_counts().get(&1), None);
        assert_eq!(split.train.label_counts()[&1], 1);
    }

    #[test]
    fn test_empty_table() {
        let split = stratified_split(SampleTable::default(), 0.2, 42).unwrap();
        assert!(split.train.is_empty());
        assert!(split.val.is_empty());
    }
}
