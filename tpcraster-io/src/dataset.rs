//! Rasterized dataset container (HDF5).
//!
//! Labeled datasets store `train_features`, `train_targets`, `test_features`,
//! `test_targets` and `max_charge`; unlabeled datasets store `images` and
//! `max_charge`. Features are `(N, 128, 128, 3)` `u8`, targets `(N,)` `u8` and
//! `max_charge` a one-element `f64` array.

use crate::{Error, Result};
use hdf5::types::H5Type;
use hdf5::{Dataset, File, Group};
use ndarray::{Array1, Array4};
use std::path::{Path, PathBuf};
use tpcraster_render::{CHANNELS, IMAGE_SIZE};

pub const TRAIN_FEATURES: &str = "train_features";
pub const TRAIN_TARGETS: &str = "train_targets";
pub const TEST_FEATURES: &str = "test_features";
pub const TEST_TARGETS: &str = "test_targets";
pub const IMAGES: &str = "images";
pub const MAX_CHARGE: &str = "max_charge";

/// File name suffix of every generated dataset.
pub const OUTPUT_SUFFIX: &str = "images.h5";

const CHUNK_IMAGES: usize = 64;

/// Images with one class index per image.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImages {
    pub features: Array4<u8>,
    pub targets: Array1<u8>,
}

impl LabeledImages {
    /// An empty partition.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            features: Array4::zeros((0, IMAGE_SIZE, IMAGE_SIZE, CHANNELS)),
            targets: Array1::zeros(0),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Everything persisted by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterizedDataset {
    Labeled {
        train: LabeledImages,
        test: LabeledImages,
        max_charge: f64,
    },
    Unlabeled {
        images: Array4<u8>,
        max_charge: f64,
    },
}

impl RasterizedDataset {
    /// The normalization scale.
    #[must_use]
    pub fn max_charge(&self) -> f64 {
        match self {
            RasterizedDataset::Labeled { max_charge, .. }
            | RasterizedDataset::Unlabeled { max_charge, .. } => *max_charge,
        }
    }

    /// Total number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            RasterizedDataset::Labeled { train, test, .. } => train.len() + test.len(),
            RasterizedDataset::Unlabeled { images, .. } => images.dim().0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Container write configuration.
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    /// Deflate level for image datasets; `None` stores them uncompressed.
    pub compression: Option<u8>,
}

impl WriteOptions {
    #[must_use]
    pub fn with_compression(mut self, level: Option<u8>) -> Self {
        self.compression = level;
        self
    }
}

/// `<save_path>/<prefix>images.h5`.
#[must_use]
pub fn output_path(save_path: &Path, prefix: &str) -> PathBuf {
    save_path.join(format!("{prefix}{OUTPUT_SUFFIX}"))
}

/// Writes `dataset` to `path`, creating parent directories and replacing any
/// existing file.
///
/// # Errors
/// Returns an error if a directory, the file or a dataset cannot be created.
pub fn write_dataset<P: AsRef<Path>>(
    path: P,
    dataset: &RasterizedDataset,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    match dataset {
        RasterizedDataset::Labeled {
            train,
            test,
            max_charge,
        } => {
            write_images(&file, TRAIN_FEATURES, &train.features, options)?;
            write_array(&file, TRAIN_TARGETS, &train.targets)?;
            write_images(&file, TEST_FEATURES, &test.features, options)?;
            write_array(&file, TEST_TARGETS, &test.targets)?;
            write_array(&file, MAX_CHARGE, &Array1::from_elem(1, *max_charge))?;
        }
        RasterizedDataset::Unlabeled { images, max_charge } => {
            write_images(&file, IMAGES, images, options)?;
            write_array(&file, MAX_CHARGE, &Array1::from_elem(1, *max_charge))?;
        }
    }
    Ok(())
}

/// Reads a container back without any post-processing.
///
/// # Errors
/// Returns an error if the file cannot be opened or a required dataset is
/// missing or malformed.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<RasterizedDataset> {
    let file = open_container(path)?;
    if let Some(images) = read_unlabeled_images(&file)? {
        return Ok(RasterizedDataset::Unlabeled {
            images,
            max_charge: read_max_charge(&file)?,
        });
    }
    let (train, test, max_charge) = read_labeled(&file)?;
    Ok(RasterizedDataset::Labeled {
        train,
        test,
        max_charge,
    })
}

pub(crate) fn open_container<P: AsRef<Path>>(path: P) -> Result<File> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    Ok(File::open(path)?)
}

/// Reads the `images` dataset if the container has one.
pub(crate) fn read_unlabeled_images(file: &File) -> Result<Option<Array4<u8>>> {
    if file.member_names()?.iter().any(|member| member == IMAGES) {
        Ok(Some(read_images(file, IMAGES)?))
    } else {
        Ok(None)
    }
}

/// Reads both partitions and the scale of a labeled container.
pub(crate) fn read_labeled(file: &File) -> Result<(LabeledImages, LabeledImages, f64)> {
    Ok((
        read_partition(file, TRAIN_FEATURES, TRAIN_TARGETS)?,
        read_partition(file, TEST_FEATURES, TEST_TARGETS)?,
        read_max_charge(file)?,
    ))
}

fn write_images(
    group: &Group,
    name: &str,
    images: &Array4<u8>,
    options: &WriteOptions,
) -> Result<()> {
    let (n, h, w, c) = images.dim();
    let mut builder = group.new_dataset::<u8>().shape((n, h, w, c));
    if let (Some(level), true) = (options.compression, n > 0) {
        builder = builder.chunk((n.min(CHUNK_IMAGES), h, w, c)).deflate(level);
    }
    let dataset = builder.create(name)?;
    if n > 0 {
        dataset.write(images.view())?;
    }
    Ok(())
}

fn write_array<T: H5Type>(group: &Group, name: &str, data: &Array1<T>) -> Result<()> {
    let dataset = group.new_dataset::<T>().shape((data.len(),)).create(name)?;
    if !data.is_empty() {
        dataset.write(data.view())?;
    }
    Ok(())
}

fn read_partition(file: &File, features: &str, targets: &str) -> Result<LabeledImages> {
    let features = read_images(file, features)?;
    let targets = read_vec::<u8>(&file.dataset(targets)?)?;
    if targets.len() != features.dim().0 {
        return Err(Error::InvalidFormat(format!(
            "{} images but {} targets",
            features.dim().0,
            targets.len()
        )));
    }
    Ok(LabeledImages {
        features,
        targets: Array1::from(targets),
    })
}

fn read_images(group: &Group, name: &str) -> Result<Array4<u8>> {
    let dataset = group.dataset(name)?;
    let shape = dataset.shape();
    if shape.len() != 4 || shape[1..] != [IMAGE_SIZE, IMAGE_SIZE, CHANNELS] {
        return Err(Error::InvalidFormat(format!(
            "{name} has shape {shape:?}, expected (N, {IMAGE_SIZE}, {IMAGE_SIZE}, {CHANNELS})"
        )));
    }
    let dim = (shape[0], shape[1], shape[2], shape[3]);
    let raw = read_vec::<u8>(&dataset)?;
    Array4::from_shape_vec(dim, raw)
        .map_err(|e| Error::InvalidFormat(format!("{name} shape mismatch: {e}")))
}

fn read_max_charge(group: &Group) -> Result<f64> {
    let values = read_vec::<f64>(&group.dataset(MAX_CHARGE)?)?;
    values
        .first()
        .copied()
        .ok_or_else(|| Error::InvalidFormat(format!("{MAX_CHARGE} is empty")))
}

fn read_vec<T: H5Type>(dataset: &Dataset) -> Result<Vec<T>> {
    if dataset.size() == 0 {
        return Ok(Vec::new());
    }
    Ok(dataset.read_raw::<T>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn images(n: usize, seed: u8) -> Array4<u8> {
        Array4::from_shape_fn((n, IMAGE_SIZE, IMAGE_SIZE, CHANNELS), |(i, r, c, ch)| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (i * 7 + r * 3 + c + ch) as u8;
            v.wrapping_add(seed)
        })
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("out"), "sim_"),
            PathBuf::from("out/sim_images.h5")
        );
        assert_eq!(output_path(Path::new(""), ""), PathBuf::from("images.h5"));
    }

    #[test]
    fn test_labeled_roundtrip_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/images.h5");
        let dataset = RasterizedDataset::Labeled {
            train: LabeledImages {
                features: images(3, 0),
                targets: Array1::from(vec![0, 2, 1]),
            },
            test: LabeledImages {
                features: images(1, 9),
                targets: Array1::from(vec![1]),
            },
            max_charge: 3.25,
        };

        write_dataset(&path, &dataset, &WriteOptions::default()).unwrap();
        assert_eq!(read_dataset(&path).unwrap(), dataset);
    }

    #[test]
    fn test_compressed_roundtrip_with_empty_test() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("images.h5");
        let dataset = RasterizedDataset::Labeled {
            train: LabeledImages {
                features: images(2, 1),
                targets: Array1::from(vec![0, 0]),
            },
            test: LabeledImages::empty(),
            max_charge: 1.5,
        };

        let options = WriteOptions::default().with_compression(Some(4));
        write_dataset(&path, &dataset, &options).unwrap();
        let loaded = read_dataset(&path).unwrap();
        assert_eq!(loaded, dataset);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_unlabeled_roundtrip_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("images.h5");
        let first = RasterizedDataset::Unlabeled {
            images: images(4, 3),
            max_charge: 2.0,
        };
        let second = RasterizedDataset::Unlabeled {
            images: images(2, 5),
            max_charge: 4.0,
        };

        write_dataset(&path, &first, &WriteOptions::default()).unwrap();
        write_dataset(&path, &second, &WriteOptions::default()).unwrap();
        let loaded = read_dataset(&path).unwrap();
        assert_eq!(loaded, second);
        assert!((loaded.max_charge() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_container() {
        let dir = TempDir::new().unwrap();
        let err = read_dataset(dir.path().join("absent.h5")).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }
}
