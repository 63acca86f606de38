//! Class labels, label tables and class-name lookup.

use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ground-truth class of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EventLabel {
    Proton,
    Carbon,
    Junk,
    /// No ground truth (unlabeled real data).
    Unlabeled,
}

impl EventLabel {
    /// Labels that carry a class, in class-index order.
    pub const CLASSES: [EventLabel; 3] = [EventLabel::Proton, EventLabel::Carbon, EventLabel::Junk];

    /// Integer code: proton=0, carbon=1, junk=2, unlabeled=-1.
    #[must_use]
    pub fn code(self) -> i8 {
        match self {
            EventLabel::Proton => 0,
            EventLabel::Carbon => 1,
            EventLabel::Junk => 2,
            EventLabel::Unlabeled => -1,
        }
    }

    /// Class index as stored in target arrays, `None` for unlabeled events.
    #[must_use]
    pub fn class_index(self) -> Option<u8> {
        u8::try_from(self.code()).ok()
    }
}

impl FromStr for EventLabel {
    type Err = Error;

    /// Parses a label-table code (`p`, `c` or `j`).
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "p" => Ok(EventLabel::Proton),
            "c" => Ok(EventLabel::Carbon),
            "j" => Ok(EventLabel::Junk),
            other => Err(Error::InvalidLabelCode(other.to_string())),
        }
    }
}

impl std::fmt::Display for EventLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventLabel::Proton => write!(f, "proton"),
            EventLabel::Carbon => write!(f, "carbon"),
            EventLabel::Junk => write!(f, "junk"),
            EventLabel::Unlabeled => write!(f, "unlabeled"),
        }
    }
}

/// An event together with its class label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledEvent {
    pub cloud: PointCloud,
    pub label: EventLabel,
}

impl LabeledEvent {
    #[must_use]
    pub fn new(cloud: PointCloud, label: EventLabel) -> Self {
        Self { cloud, label }
    }
}

/// Hand-labeled classification of the events of one run.
///
/// Rows keep their table order. Rows whose code is not `p`, `c` or `j` are
/// dropped when the table is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    rows: Vec<(u64, EventLabel)>,
}

impl LabelTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(event id, code)` rows, ignoring unknown codes.
    pub fn from_codes<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (u64, &'a str)>,
    {
        let mut table = Self::new();
        for (evt_id, code) in rows {
            match code.parse::<EventLabel>() {
                Ok(label) => table.insert(evt_id, label),
                Err(_) => log::debug!("ignoring event {evt_id} with label code {code:?}"),
            }
        }
        table
    }

    /// Appends a row.
    pub fn insert(&mut self, evt_id: u64, label: EventLabel) {
        self.rows.push((evt_id, label));
    }

    /// Event ids carrying `label`, in table order.
    pub fn ids_with(&self, label: EventLabel) -> impl Iterator<Item = u64> + '_ {
        self.rows
            .iter()
            .filter(move |(_, l)| *l == label)
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ordered class names used to decode model predictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames(Vec<String>);

impl ClassNames {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ClassNames {
    /// `proton`, `carbon`, `junk`.
    fn default() -> Self {
        Self(EventLabel::CLASSES.iter().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_codes() {
        assert_eq!(EventLabel::Proton.code(), 0);
        assert_eq!(EventLabel::Carbon.code(), 1);
        assert_eq!(EventLabel::Junk.code(), 2);
        assert_eq!(EventLabel::Unlabeled.code(), -1);
        assert_eq!(EventLabel::Unlabeled.class_index(), None);
        let indices: Vec<_> = EventLabel::CLASSES.iter().map(|l| l.class_index()).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_parse_letter_codes() {
        assert_eq!("p".parse::<EventLabel>().unwrap(), EventLabel::Proton);
        assert_eq!("c".parse::<EventLabel>().unwrap(), EventLabel::Carbon);
        assert_eq!("j".parse::<EventLabel>().unwrap(), EventLabel::Junk);
        assert!(matches!(
            "P".parse::<EventLabel>(),
            Err(Error::InvalidLabelCode(_))
        ));
    }

    #[test]
    fn test_label_table_keeps_order_and_drops_unknown() {
        let table = LabelTable::from_codes([(5, "c"), (1, "p"), (9, "x"), (3, "p"), (7, "j")]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.ids_with(EventLabel::Proton).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(table.ids_with(EventLabel::Carbon).collect::<Vec<_>>(), vec![5]);
        assert_eq!(table.ids_with(EventLabel::Junk).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_default_class_names() {
        let names = ClassNames::default();
        assert_eq!(names.len(), 3);
        assert_eq!(names.get(0), Some("proton"));
        assert_eq!(names.get(1), Some("carbon"));
        assert_eq!(names.get(2), Some("junk"));
        assert_eq!(names.get(3), None);
    }
}
