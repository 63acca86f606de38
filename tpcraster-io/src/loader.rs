//! Training-time dataset loader and prediction decoding.

use crate::dataset::{open_container, read_labeled, read_unlabeled_images, LabeledImages};
use crate::{Error, Result};
use ndarray::{Array1, Array2, Array4};
use std::collections::BTreeSet;
use std::path::Path;
use tpcraster_core::ClassNames;

/// Post-processing applied by [`load_image_h5`].
#[derive(Clone, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct LoadOptions {
    /// Expand targets to one-hot rows.
    pub categorical: bool,
    /// Reshape each image into one vector.
    pub flatten: bool,
    /// Also return the stored normalization scale.
    pub max_charge: bool,
    /// Collapse every non-zero label to 1 (proton vs. non-proton).
    pub binary: bool,
}

impl LoadOptions {
    #[must_use]
    pub fn with_categorical(mut self, categorical: bool) -> Self {
        self.categorical = categorical;
        self
    }

    #[must_use]
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    #[must_use]
    pub fn with_max_charge(mut self, max_charge: bool) -> Self {
        self.max_charge = max_charge;
        self
    }

    #[must_use]
    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }
}

/// Image features, either stacked or flattened per image.
#[derive(Debug, Clone, PartialEq)]
pub enum Features {
    /// `(N, 128, 128, 3)`.
    Images(Array4<u8>),
    /// `(N, 49152)`.
    Flat(Array2<u8>),
}

impl Features {
    /// Number of examples.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Features::Images(a) => a.dim().0,
            Features::Flat(a) => a.nrows(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Targets, either class indices or one-hot rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Targets {
    Labels(Array1<u8>),
    OneHot(Array2<i8>),
}

/// Features and targets of one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub features: Features,
    pub targets: Targets,
}

/// A loaded labeled dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSplit {
    pub train: Partition,
    pub test: Partition,
    /// Present only when [`LoadOptions::max_charge`] is set.
    pub max_charge: Option<f64>,
}

/// What [`load_image_h5`] returns.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedDataset {
    /// An unlabeled container: only the images, options ignored.
    Images(Array4<u8>),
    Split(LabeledSplit),
}

/// Loads a container written by the pipeline.
///
/// `binary` is applied before `categorical`; the one-hot width is the number of
/// distinct train labels (2 with `binary`).
///
/// # Errors
/// Returns an error if the file cannot be read, or [`Error::InvalidFormat`] if a
/// label does not fit the one-hot width.
pub fn load_image_h5<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<LoadedDataset> {
    let file = open_container(path)?;
    if let Some(images) = read_unlabeled_images(&file)? {
        return Ok(LoadedDataset::Images(images));
    }

    let (mut train, mut test, max_charge) = read_labeled(&file)?;

    let mut num_categories = distinct_labels(&train.targets);
    if options.binary {
        binarize(&mut train.targets);
        binarize(&mut test.targets);
        num_categories = 2;
    }

    Ok(LoadedDataset::Split(LabeledSplit {
        train: finish_partition(train, num_categories, options)?,
        test: finish_partition(test, num_categories, options)?,
        max_charge: options.max_charge.then_some(max_charge),
    }))
}

fn finish_partition(
    part: LabeledImages,
    num_categories: usize,
    options: &LoadOptions,
) -> Result<Partition> {
    let targets = if options.categorical {
        Targets::OneHot(to_categorical(&part.targets, num_categories)?)
    } else {
        Targets::Labels(part.targets)
    };
    let features = if options.flatten {
        Features::Flat(flatten(part.features)?)
    } else {
        Features::Images(part.features)
    };
    Ok(Partition { features, targets })
}

/// Number of distinct values in `labels`.
#[must_use]
pub fn distinct_labels(labels: &Array1<u8>) -> usize {
    labels.iter().collect::<BTreeSet<_>>().len()
}

/// Maps every non-zero label to 1.
pub fn binarize(labels: &mut Array1<u8>) {
    labels.mapv_inplace(|l| u8::from(l != 0));
}

/// One-hot encodes `labels` into `(N, num_categories)` rows.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] if a label is `>= num_categories`.
pub fn to_categorical(labels: &Array1<u8>, num_categories: usize) -> Result<Array2<i8>> {
    let mut one_hot = Array2::zeros((labels.len(), num_categories));
    for (i, &label) in labels.iter().enumerate() {
        let class = usize::from(label);
        if class >= num_categories {
            return Err(Error::InvalidFormat(format!(
                "label {label} out of range for {num_categories} categories"
            )));
        }
        one_hot[[i, class]] = 1;
    }
    Ok(one_hot)
}

/// Reshapes `(N, H, W, C)` into `(N, H * W * C)`.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] if the array cannot be reshaped.
pub fn flatten(images: Array4<u8>) -> Result<Array2<u8>> {
    let (n, h, w, c) = images.dim();
    images
        .into_shape_with_order((n, h * w * c))
        .map_err(|e| Error::InvalidFormat(format!("cannot flatten images: {e}")))
}

/// Top-`top` `(class name, probability)` pairs over the default class names
/// (`proton`, `carbon`, `junk`), highest first.
///
/// # Errors
/// See [`decode_predictions_with`].
pub fn decode_predictions(preds: &[f32], top: usize) -> Result<Vec<(String, f32)>> {
    decode_predictions_with(&ClassNames::default(), preds, top)
}

/// Top-`top` `(class name, probability)` pairs, highest first. Ties keep class
/// order and `top` is clamped to `preds.len()`.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] if there are more predictions than names.
pub fn decode_predictions_with(
    names: &ClassNames,
    preds: &[f32],
    top: usize,
) -> Result<Vec<(String, f32)>> {
    let mut decoded = preds
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            names.get(i).map(|name| (name.to_string(), p)).ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "{} predictions but only {} class names",
                    preds.len(),
                    names.len()
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    decoded.sort_by(|a, b| b.1.total_cmp(&a.1));
    decoded.truncate(top.min(preds.len()));
    Ok(decoded)
}
