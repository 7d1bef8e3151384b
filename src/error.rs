//! Error type shared by the library modules.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Everything that can go wrong while selecting, fetching or searching files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A `spectrum_filename` cell that is not `<accession>/<filename>`.
    #[error("malformed spectrum identifier {0:?}: expected \"<accession>/<filename>\"")]
    MalformedIdentifier(String),

    #[error("column {column:?} not found in {}", path.display())]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("unrecognized split {0:?}: expected one of train, valid, test")]
    UnknownSplit(String),

    #[error("invalid download URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("download of {url} failed: HTTP {status}")]
    DownloadStatus { url: String, status: reqwest::StatusCode },

    #[error("sage search for the {split} split exited with {status} (see {})", log.display())]
    SearchFailed { split: &'static str, status: ExitStatus, log: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
