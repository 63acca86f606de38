//! Charge transform and dataset normalization.
//!
//! Raw charge spans several orders of magnitude, so every event's charge column is
//! first mapped through [`log_charge`]. A single global scale, the largest
//! log-charge in the train partition, then maps charges into `[0, 1]` for train
//! events. Test events are divided by the same scale and are not clamped.

use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use crate::label::LabeledEvent;

/// Safe log transform of one raw charge value: `0` stays `0`, anything else is
/// `log10(a)`. Negative input is a caller error.
#[inline]
#[must_use]
pub fn log_charge(a: f64) -> f64 {
    if a == 0.0 {
        0.0
    } else {
        a.log10()
    }
}

/// Applies [`log_charge`] to every point of `cloud`.
pub fn apply_log_charge(cloud: &mut PointCloud) {
    for c in &mut cloud.charge {
        *c = log_charge(*c);
    }
}

/// Applies [`log_charge`] to every event.
pub fn apply_log_charge_all(events: &mut [LabeledEvent]) {
    for event in events {
        apply_log_charge(&mut event.cloud);
    }
}

/// Global charge scale computed from a train partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeScale {
    max_charge: f64,
}

impl ChargeScale {
    /// Computes the scale as the largest (log-transformed) charge over all points of
    /// all `train` events.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateScale`] if the partition contains no point at all
    /// or if the maximum is zero.
    pub fn fit(train: &[LabeledEvent]) -> Result<Self> {
        let max_charge = train
            .iter()
            .filter_map(|e| e.cloud.max_charge())
            .reduce(f64::max)
            .ok_or_else(|| {
                Error::DegenerateScale("train partition contains no points".to_string())
            })?;
        Self::from_max_charge(max_charge)
    }

    /// Wraps a previously computed scale.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateScale`] if `max_charge` is zero or not finite.
    pub fn from_max_charge(max_charge: f64) -> Result<Self> {
        if max_charge == 0.0 || !max_charge.is_finite() {
            return Err(Error::DegenerateScale(format!(
                "max charge is {max_charge}"
            )));
        }
        Ok(Self { max_charge })
    }

    /// The scale value persisted alongside the images.
    #[must_use]
    pub fn max_charge(&self) -> f64 {
        self.max_charge
    }

    /// Divides every charge of `cloud` by the scale.
    pub fn apply(&self, cloud: &mut PointCloud) {
        for c in &mut cloud.charge {
            *c /= self.max_charge;
        }
    }

    /// Divides every charge of every event by the scale.
    pub fn apply_all(&self, events: &mut [LabeledEvent]) {
        for event in events {
            self.apply(&mut event.cloud);
        }
    }
}

/// Fits the scale on `train` and applies it to both partitions.
///
/// # Errors
/// Propagates [`ChargeScale::fit`] failures; no event is modified in that case.
pub fn normalize_partitions(
    train: &mut [LabeledEvent],
    test: &mut [LabeledEvent],
) -> Result<ChargeScale> {
    let scale = ChargeScale::fit(train)?;
    scale.apply_all(train);
    scale.apply_all(test);
    Ok(scale)
}
