//! tpcraster-core: Core types for AT-TPC event rasterization.
//!
//! This crate provides the point-cloud data model, class labels, the charge
//! transform and normalizer, the train/test splitter, and the labeling policies
//! for labeled real, unlabeled real and simulated data.
//!

pub mod charge;
pub mod cloud;
pub mod error;
pub mod label;
pub mod labeling;
pub mod projection;
pub mod source;
pub mod split;

pub use charge::{
    apply_log_charge, apply_log_charge_all, log_charge, normalize_partitions, ChargeScale,
};
pub use cloud::{Point, PointCloud};
pub use error::{Error, Result};
pub use label::{ClassNames, EventLabel, LabelTable, LabeledEvent};
pub use labeling::{class_counts, label_real_run, label_simulated, label_unlabeled_run};
pub use projection::{AxisRange, Projection, DRIFT_RANGE, PAD_PLANE_RANGE};
pub use source::{EventSource, InMemoryEvents, NoiseModel, UniformNoise, UniformNoiseConfig};
pub use split::{shuffle, shuffle_split, Split, SplitConfig};
