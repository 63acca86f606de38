//! Point-cloud storage for a single detector event.
//!
//! A [`PointCloud`] stores the `(x, y, z, charge)` points of one AT-TPC trigger in
//! parallel vectors (`SoA` layout) rather than a vector of 4-tuples. The charge
//! column is rewritten in place by the charge transform and the normalizer, and the
//! renderer only ever reads two coordinate columns plus the charge column.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single point of an event, in physical detector units (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub charge: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64, charge: f64) -> Self {
        Self { x, y, z, charge }
    }
}

/// The points of one event stored in Structure of Arrays (`SoA`) format.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointCloud {
    /// Columnar storage for X coordinates.
    pub x: Vec<f64>,
    /// Columnar storage for Y coordinates.
    pub y: Vec<f64>,
    /// Columnar storage for Z coordinates (drift axis).
    pub z: Vec<f64>,
    /// Columnar storage for charge (raw, log-scaled or normalized).
    pub charge: Vec<f64>,
}

impl PointCloud {
    /// Creates a new empty cloud with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            z: Vec::with_capacity(capacity),
            charge: Vec::with_capacity(capacity),
        }
    }

    /// Builds a cloud from its four columns.
    ///
    /// # Errors
    /// Returns [`Error::MalformedCloud`] if the columns differ in length.
    pub fn from_columns(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>, charge: Vec<f64>) -> Result<Self> {
        let n = x.len();
        if y.len() != n || z.len() != n || charge.len() != n {
            return Err(Error::MalformedCloud(format!(
                "column lengths differ: x={}, y={}, z={}, charge={}",
                n,
                y.len(),
                z.len(),
                charge.len()
            )));
        }
        Ok(Self { x, y, z, charge })
    }

    /// The placeholder cloud used for synthetic junk events: one all-zero point.
    #[must_use]
    pub fn placeholder() -> Self {
        let mut cloud = Self::with_capacity(1);
        cloud.push(Point::new(0.0, 0.0, 0.0, 0.0));
        cloud
    }

    /// Returns the number of points in the cloud.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Pushes a single point into the cloud.
    pub fn push(&mut self, point: Point) {
        self.x.push(point.x);
        self.y.push(point.y);
        self.z.push(point.z);
        self.charge.push(point.charge);
    }

    /// Appends all points from another cloud to this one.
    pub fn append(&mut self, other: &PointCloud) {
        self.x.extend_from_slice(&other.x);
        self.y.extend_from_slice(&other.y);
        self.z.extend_from_slice(&other.z);
        self.charge.extend_from_slice(&other.charge);
    }

    /// Returns the point at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point> {
        Some(Point::new(
            *self.x.get(index)?,
            *self.y.get(index)?,
            *self.z.get(index)?,
            *self.charge.get(index)?,
        ))
    }

    /// Iterates over the points in order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Largest charge value in the cloud, or `None` for an empty cloud.
    #[must_use]
    pub fn max_charge(&self) -> Option<f64> {
        self.charge.iter().copied().reduce(f64::max)
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut cloud = Self::with_capacity(iter.size_hint().0);
        for point in iter {
            cloud.push(point);
        }
        cloud
    }
}
