//! Filesystem layout of a project checkout.
//!
//! Every path the pipeline touches is resolved from a single project root,
//! and each can be overridden individually (the CLI exposes one flag per
//! field).
use std::path::{Path, PathBuf};

use crate::search::SearchConfig;

/// Default metadata table, relative to the root.
pub const DEFAULT_METADATA: &str = "data/manual/massivekb_v2.0.15-hcd-files.tsv";
pub const DEFAULT_CACHE_DIR: &str = "data/mzml";
pub const DEFAULT_RESULTS_DIR: &str = "data/spectrum-quality";
pub const DEFAULT_FASTA: &str = "data/fasta/human.fasta";
pub const DEFAULT_SAGE_CONFIG: &str = "data/manual/sage.json";
pub const DEFAULT_SAGE_BIN: &str = "bin/sage";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Name of the persisted assignment inside the results directory.
pub const SPLITS_FILE: &str = "splits.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// TSV listing every candidate spectrum file.
    pub metadata: PathBuf,
    /// Download cache; files land in `<cache_dir>/<accession>/<filename>`.
    pub cache_dir: PathBuf,
    /// Per-split search output and `splits.json`.
    pub results_dir: PathBuf,
    pub fasta: PathBuf,
    pub sage_config: PathBuf,
    pub sage_bin: PathBuf,
    pub log_dir: PathBuf,
}

impl PipelineConfig {
    /// Default layout below `root`.
    pub fn from_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            metadata: root.join(DEFAULT_METADATA),
            cache_dir: root.join(DEFAULT_CACHE_DIR),
            results_dir: root.join(DEFAULT_RESULTS_DIR),
            fasta: root.join(DEFAULT_FASTA),
            sage_config: root.join(DEFAULT_SAGE_CONFIG),
            sage_bin: root.join(DEFAULT_SAGE_BIN),
            log_dir: root.join(DEFAULT_LOG_DIR),
        }
    }

    pub fn splits_path(&self) -> PathBuf { self.results_dir.join(SPLITS_FILE) }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            sage_bin: self.sage_bin.clone(),
            sage_config: self.sage_config.clone(),
            fasta: self.fasta.clone(),
            results_root: self.results_dir.clone(),
            log_dir: self.log_dir.clone(),
        }
    }
}
