//! HDF5 point-cloud event files.
//!
//! Layout: one group (default `clouds`) holding a 2-D `f64` dataset per event,
//! named by the decimal event id, shaped `(n_points, >= 4)` with columns
//! `x, y, z, charge`. Extra columns are ignored.

use crate::{Error, Result};
use hdf5::{File, Group};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use tpcraster_core::{EventSource, PointCloud};

/// Group holding the per-event datasets.
pub const DEFAULT_EVENT_GROUP: &str = "clouds";

const POINT_COLUMNS: usize = 4;

/// Read access to an HDF5 event file.
pub struct Hdf5EventFile {
    _file: File,
    group: Group,
    path: PathBuf,
}

impl Hdf5EventFile {
    /// Opens `path` and its default event group.
    ///
    /// # Errors
    /// Returns [`Error::MissingInput`] if the file does not exist, or an HDF5
    /// error if it cannot be opened or lacks the group.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_group(path, DEFAULT_EVENT_GROUP)
    }

    /// Opens `path` reading events from `group_name`.
    ///
    /// # Errors
    /// See [`Hdf5EventFile::open`].
    pub fn open_group<P: AsRef<Path>>(path: P, group_name: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let group = file.group(group_name)?;
        Ok(Self {
            _file: file,
            group,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for Hdf5EventFile {
    type Error = Error;

    /// Event ids in ascending numeric order. Members whose name is not an
    /// integer are skipped.
    fn event_ids(&self) -> Result<Vec<u64>> {
        let mut ids: Vec<u64> = self
            .group
            .member_names()?
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn read_event(&self, evt_id: u64) -> Result<PointCloud> {
        let name = evt_id.to_string();
        if !self.group.link_exists(&name) {
            return Err(tpcraster_core::Error::EventNotFound(evt_id).into());
        }
        let dataset = self.group.dataset(&name)?;

        let shape = dataset.shape();
        if shape.len() != 2 || shape[1] < POINT_COLUMNS {
            return Err(Error::InvalidFormat(format!(
                "event {evt_id} in {} has shape {shape:?}, expected (n, >= {POINT_COLUMNS})",
                self.path.display()
            )));
        }
        if shape[0] == 0 {
            return Ok(PointCloud::default());
        }

        let data: Array2<f64> = dataset.read_2d()?;
        let column = |i: usize| data.column(i).to_vec();
        Ok(PointCloud::from_columns(
            column(0),
            column(1),
            column(2),
            column(3),
        )?)
    }
}

/// Writes events into a new event file at `path` (overwriting it), using the
/// default layout.
///
/// # Errors
/// Returns an error if the file or any dataset cannot be written.
pub fn write_event_file<'a, P, I>(path: P, events: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (u64, &'a PointCloud)>,
{
    let file = File::create(path)?;
    let group = file.create_group(DEFAULT_EVENT_GROUP)?;

    for (evt_id, cloud) in events {
        let n = cloud.len();
        let dataset = group
            .new_dataset::<f64>()
            .shape((n, POINT_COLUMNS))
            .create(evt_id.to_string().as_str())?;
        if n == 0 {
            continue;
        }
        let data = Array2::from_shape_fn((n, POINT_COLUMNS), |(row, col)| match col {
            0 => cloud.x[row],
            1 => cloud.y[row],
            2 => cloud.z[row],
            _ => cloud.charge[row],
        });
        dataset.write(data.view())?;
    }
    Ok(())
}
