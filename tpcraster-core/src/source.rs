//! Event sources and noise injection.
//!
//! The pipeline never talks to a file format directly. Detector events come
//! through an [`EventSource`], and simulated events may be passed through a
//! [`NoiseModel`] before labeling.

use crate::cloud::{Point, PointCloud};
use crate::error::{Error, Result};
use crate::projection::{DRIFT_RANGE, PAD_PLANE_RANGE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// A readable collection of events keyed by event id.
pub trait EventSource {
    /// Error produced by the underlying reader.
    type Error;

    /// All event ids, in source order.
    fn event_ids(&self) -> std::result::Result<Vec<u64>, Self::Error>;

    /// Reads the point cloud of one event.
    fn read_event(&self, evt_id: u64) -> std::result::Result<PointCloud, Self::Error>;
}

/// Events held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEvents {
    order: Vec<u64>,
    events: BTreeMap<u64, PointCloud>,
}

impl InMemoryEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an event. A new id is appended to the iteration order.
    pub fn insert(&mut self, evt_id: u64, cloud: PointCloud) {
        if self.events.insert(evt_id, cloud).is_none() {
            self.order.push(evt_id);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<(u64, PointCloud)> for InMemoryEvents {
    fn from_iter<I: IntoIterator<Item = (u64, PointCloud)>>(iter: I) -> Self {
        let mut events = Self::new();
        for (id, cloud) in iter {
            events.insert(id, cloud);
        }
        events
    }
}

impl EventSource for InMemoryEvents {
    type Error = Error;

    fn event_ids(&self) -> Result<Vec<u64>> {
        Ok(self.order.clone())
    }

    fn read_event(&self, evt_id: u64) -> Result<PointCloud> {
        self.events
            .get(&evt_id)
            .cloned()
            .ok_or(Error::EventNotFound(evt_id))
    }
}

/// Synthetic noise augmentation for simulated events.
pub trait NoiseModel {
    /// Returns `cloud` with noise added. The input is left untouched.
    fn augment(&mut self, cloud: &PointCloud) -> PointCloud;
}

/// Configuration for [`UniformNoise`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformNoiseConfig {
    /// Minimum number of noise points added per event.
    pub min_points: usize,
    /// Maximum number of noise points added per event (inclusive).
    pub max_points: usize,
    /// Lower bound of the raw noise charge.
    pub min_charge: f64,
    /// Upper bound of the raw noise charge.
    pub max_charge: f64,
}

impl Default for UniformNoiseConfig {
    fn default() -> Self {
        Self {
            min_points: 20,
            max_points: 100,
            min_charge: 1.0,
            max_charge: 400.0,
        }
    }
}

impl UniformNoiseConfig {
    /// Set the inclusive range of noise points per event.
    #[must_use]
    pub fn with_points(mut self, min_points: usize, max_points: usize) -> Self {
        self.min_points = min_points;
        self.max_points = max_points;
        self
    }

    /// Set the raw charge range of noise points.
    #[must_use]
    pub fn with_charge(mut self, min_charge: f64, max_charge: f64) -> Self {
        self.min_charge = min_charge;
        self.max_charge = max_charge;
        self
    }

    /// Checks that both ranges are ordered and charges are non-negative.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.min_points > self.max_points {
            return Err(Error::ConfigError(format!(
                "noise min_points ({}) exceeds max_points ({})",
                self.min_points, self.max_points
            )));
        }
        if !(0.0..=self.max_charge).contains(&self.min_charge) {
            return Err(Error::ConfigError(format!(
                "noise charge range [{}, {}] is invalid",
                self.min_charge, self.max_charge
            )));
        }
        Ok(())
    }
}

/// Adds points uniformly distributed over the active volume.
#[derive(Debug, Clone)]
pub struct UniformNoise {
    config: UniformNoiseConfig,
    rng: StdRng,
}

impl UniformNoise {
    /// Creates a seeded noise model.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] if the configuration is invalid.
    pub fn new(config: UniformNoiseConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl NoiseModel for UniformNoise {
    fn augment(&mut self, cloud: &PointCloud) -> PointCloud {
        let count = self
            .rng
            .gen_range(self.config.min_points..=self.config.max_points);
        let mut noisy = PointCloud::with_capacity(cloud.len() + count);
        noisy.append(cloud);
        for _ in 0..count {
            noisy.push(Point::new(
                self.rng.gen_range(PAD_PLANE_RANGE.min..=PAD_PLANE_RANGE.max),
                self.rng.gen_range(PAD_PLANE_RANGE.min..=PAD_PLANE_RANGE.max),
                self.rng.gen_range(DRIFT_RANGE.min..=DRIFT_RANGE.max),
                self.rng
                    .gen_range(self.config.min_charge..=self.config.max_charge),
            ));
        }
        noisy
    }
}
