//! In-memory batch iteration over a split
//!
//! Feeds `(image path, label)` pairs to a training loop without touching
//! the filesystem. Shuffling is opt-in and seeded.

use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::sample::SampleTable;
use crate::utils::error::{PrepError, Result};

/// One batch of image paths with their label codes
pub type Batch = Vec<(PathBuf, usize)>;

/// Batched view over a sample table
#[derive(Debug, Clone)]
pub struct SampleBatches {
    items: Vec<(PathBuf, usize)>,
    batch_size: usize,
    cursor: usize,
}

impl SampleBatches {
    pub fn new(table: &SampleTable, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(PrepError::Config("Batch size must be at least 1".to_string()));
        }

        Ok(Self {
            items: table
                .iter()
                .map(|s| (s.image_path.clone(), s.label))
                .collect(),
            batch_size,
            cursor: 0,
        })
    }

    /// Shuffle the item order with a seeded generator
    pub fn shuffled(mut self, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.items.shuffle(&mut rng);
        self
    }

    pub fn num_batches(&self) -> usize {
        self.items.len().div_ceil(self.batch_size)
    }

    pub fn len_items(&self) -> usize {
        self.items.len()
    }
}

impl Iterator for SampleBatches {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.items.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size).min(self.items.len());
        let batch = self.items[self.cursor..end].to_vec();
        self.cursor = end;
        Some(batch)
    }
}
