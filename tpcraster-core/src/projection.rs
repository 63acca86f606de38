//! Projection selectors and the physical detector bounds they map onto.

use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]` in detector units (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Pad-plane extent, used for both x and y.
pub const PAD_PLANE_RANGE: AxisRange = AxisRange::new(-275.0, 275.0);
/// Drift-axis extent.
pub const DRIFT_RANGE: AxisRange = AxisRange::new(0.0, 1250.0);

/// Which two spatial axes are rendered into the image plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Projection {
    /// Horizontal x, vertical y (looking down the beam axis).
    Xy,
    /// Horizontal z, vertical y (side view along the drift axis).
    Zy,
}

impl Projection {
    /// Horizontal axis range.
    #[must_use]
    pub fn horizontal_range(self) -> AxisRange {
        match self {
            Projection::Xy => PAD_PLANE_RANGE,
            Projection::Zy => DRIFT_RANGE,
        }
    }

    /// Vertical axis range (always the pad plane's y extent).
    #[must_use]
    pub fn vertical_range(self) -> AxisRange {
        PAD_PLANE_RANGE
    }

    /// The `(horizontal, vertical)` coordinate columns of `cloud`.
    #[must_use]
    pub fn columns(self, cloud: &PointCloud) -> (&[f64], &[f64]) {
        match self {
            Projection::Xy => (cloud.x.as_slice(), cloud.y.as_slice()),
            Projection::Zy => (cloud.z.as_slice(), cloud.y.as_slice()),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Projection::Xy => "xy",
            Projection::Zy => "zy",
        }
    }
}

impl FromStr for Projection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "xy" => Ok(Projection::Xy),
            "zy" => Ok(Projection::Zy),
            other => Err(Error::InvalidProjection(other.to_string())),
        }
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
