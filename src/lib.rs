#![forbid(unsafe_code)]
//! # mskb-split
//!
//! Builds reproducible **train / valid / test** splits of raw spectrum files
//! from the MassIVE-KB file table, downloads the selected files from
//! **MassIVE**, and assigns peptide-spectrum matches to each split with the
//! **Sage** search engine.
//!
//! ## Pipeline
//! 1. [`select`] picks one file per accession with a seeded shuffle and slices
//!    the result into the three splits.
//! 2. [`download`] fetches each selected file into a local cache, skipping
//!    files already there.
//! 3. [`search`] runs Sage once per split, skipping splits whose result file
//!    already exists.
//! 4. [`pipeline`] ties the steps together and writes `splits.json`.
//!
//! Everything runs sequentially; a failed run can simply be started again.
//!
//! ## Examples
//! ```rust
//! use mskb_split::{select_splits, SplitLabel, SplitSizes};
//! let table = ["MSV1/a.mzML", "MSV2/b.mzML", "MSV2/c.mzML", "MSV3/d.mzML"];
//! let splits = select_splits(table, SplitSizes::new(1, 1, 1), 42).unwrap();
//! assert_eq!(splits.get(SplitLabel::Train).len(), 1);
//! // Same seed, same answer.
//! assert_eq!(splits, select_splits(table, SplitSizes::new(1, 1, 1), 42).unwrap());
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod search;
pub mod select;

pub use config::PipelineConfig;
pub use download::{Fetch, MassiveDownloader};
pub use error::{Error, Result};
pub use record::{FileRecord, SplitAssignment, SplitLabel, SplitSizes};
pub use search::{SageRunner, SearchConfig};
pub use select::{parse_identifier, read_identifiers, select_files, select_splits};

/// Crate version string (from `CARGO_PKG_VERSION`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
