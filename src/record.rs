//! Core types for **file records**, **split labels** and **split assignments**.
//!
//! A [`FileRecord`] names one raw spectrum file on MassIVE. Records are grouped
//! into the three fixed splits of [`SplitLabel`]; the grouped result is a
//! [`SplitAssignment`], which is what ends up in `splits.json`.
use core::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::error::Error;

/// One raw spectrum file: the MassIVE accession and the path below it.
///
/// The filename may itself contain `/` (e.g. `ccms_peak/RAW/run01.mzML`).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileRecord {
    /// Dataset accession such as `"MSV000079514"`. Deduplication key.
    pub accession: String,
    /// Path of the file within the dataset.
    pub filename: String,
}

impl FileRecord {
    pub fn new(accession: impl Into<String>, filename: impl Into<String>) -> Self {
        Self { accession: accession.into(), filename: filename.into() }
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.accession, self.filename)
    }
}

// Serialized as `[accession, filename]`.
impl Serialize for FileRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(2)?;
        t.serialize_element(&self.accession)?;
        t.serialize_element(&self.filename)?;
        t.end()
    }
}

/// The closed set of data splits.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum SplitLabel {
    Train,
    Valid,
    Test,
}

impl SplitLabel {
    /// Every label, in the order splits are sliced, searched and persisted.
    pub const ALL: [SplitLabel; 3] = [SplitLabel::Train, SplitLabel::Valid, SplitLabel::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            SplitLabel::Train => "train",
            SplitLabel::Valid => "valid",
            SplitLabel::Test => "test",
        }
    }

    /// Position in [`SplitLabel::ALL`]; used to index per-split tables.
    pub fn index(self) -> usize {
        match self {
            SplitLabel::Train => 0,
            SplitLabel::Valid => 1,
            SplitLabel::Test => 2,
        }
    }
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SplitLabel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "valid" => Ok(Self::Valid),
            "test" => Ok(Self::Test),
            other => Err(Error::UnknownSplit(other.to_string())),
        }
    }
}

/// Requested number of files per split.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SplitSizes {
    pub train: usize,
    pub valid: usize,
    pub test: usize,
}

impl SplitSizes {
    pub fn new(train: usize, valid: usize, test: usize) -> Self { Self { train, valid, test } }

    pub fn get(&self, label: SplitLabel) -> usize {
        match label {
            SplitLabel::Train => self.train,
            SplitLabel::Valid => self.valid,
            SplitLabel::Test => self.test,
        }
    }

    /// Sum of all three requests; saturates instead of overflowing.
    pub fn total(&self) -> usize {
        self.train.saturating_add(self.valid).saturating_add(self.test)
    }
}

/// Records selected for each split. Field order fixes the JSON key order.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct SplitAssignment {
    pub train: Vec<FileRecord>,
    pub valid: Vec<FileRecord>,
    pub test: Vec<FileRecord>,
}

impl SplitAssignment {
    pub fn get(&self, label: SplitLabel) -> &[FileRecord] {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Valid => &self.valid,
            SplitLabel::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, label: SplitLabel) -> &mut Vec<FileRecord> {
        match label {
            SplitLabel::Train => &mut self.train,
            SplitLabel::Valid => &mut self.valid,
            SplitLabel::Test => &mut self.test,
        }
    }

    /// Iterate `(label, records)` in train, valid, test order.
    pub fn iter(&self) -> impl Iterator<Item = (SplitLabel, &[FileRecord])> + '_ {
        SplitLabel::ALL.into_iter().map(move |l| (l, self.get(l)))
    }

    /// Number of records across all splits.
    pub fn len(&self) -> usize { self.train.len() + self.valid.len() + self.test.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Pretty JSON, as written to `splits.json`.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
