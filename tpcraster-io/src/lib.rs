//! tpcraster-io: File I/O and the image generation pipeline.
//!
//! This crate connects the core types and the renderer to files:
//! - **Events** - HDF5 point-cloud files behind [`tpcraster_core::EventSource`]
//! - **Labels** - hand-labeled run tables (CSV)
//! - **Dataset** - the rasterized HDF5 container, writer and loader
//! - **Pipeline** - the end-to-end `generate` run
//!

mod dataset;
mod error;
mod events;
mod labels;
mod loader;
mod pipeline;

pub use dataset::{
    output_path, read_dataset, write_dataset, LabeledImages, RasterizedDataset, WriteOptions,
    IMAGES, MAX_CHARGE, OUTPUT_SUFFIX, TEST_FEATURES, TEST_TARGETS, TRAIN_FEATURES,
    TRAIN_TARGETS,
};
pub use error::{Error, Result};
pub use events::{write_event_file, Hdf5EventFile, DEFAULT_EVENT_GROUP};
pub use labels::{parse_label_table, read_label_table};
pub use loader::{
    binarize, decode_predictions, decode_predictions_with, distinct_labels, flatten,
    load_image_h5, to_categorical, Features, LabeledSplit, LoadOptions, LoadedDataset,
    Partition, Targets,
};
pub use pipeline::{
    collect_events, rasterize_labeled, rasterize_unlabeled, run, ClassCounts, DataType, Mode,
    PipelineConfig, PipelineReport, DEFAULT_RUNS,
};
