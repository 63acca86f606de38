//! Shuffling and train/test partitioning.

use rand::seq::SliceRandom;
use rand::Rng;

/// Configuration for the train/test split.
#[derive(Clone, Debug)]
pub struct SplitConfig {
    /// Fraction of events assigned to the train partition (default: 0.8).
    pub train_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
        }
    }
}

impl SplitConfig {
    /// Set the train fraction.
    #[must_use]
    pub fn with_train_fraction(mut self, fraction: f64) -> Self {
        self.train_fraction = fraction;
        self
    }

    /// Index of the first test item for a collection of `len` items:
    /// `floor(train_fraction * len)`, capped at `len`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn partition_index(&self, len: usize) -> usize {
        let fraction = self.train_fraction.clamp(0.0, 1.0);
        ((len as f64 * fraction).floor() as usize).min(len)
    }
}

/// The two partitions produced by [`shuffle_split`].
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub test: Vec<T>,
}

/// Shuffles `items` in place with a uniform random permutation.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Shuffles `items` once, then splits them at [`SplitConfig::partition_index`].
///
/// `train ++ test` is always a permutation of the input.
pub fn shuffle_split<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    config: &SplitConfig,
    rng: &mut R,
) -> Split<T> {
    shuffle(&mut items, rng);
    let partition = config.partition_index(items.len());
    let test = items.split_off(partition);
    Split { train: items, test }
}
