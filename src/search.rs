//! Per-split Sage searches.
//!
//! Each split is searched once. The result artifact lives at
//! `<results_root>/<split>/results.sage.parquet`; if it already exists the
//! search is skipped and the existing path returned, with no validation of
//! its contents.
//!
//! Sage is spawned directly with an argument vector. Output directories and
//! log files come from a table built once per [`SageRunner`] and indexed by
//! [`SplitLabel`], so no caller-supplied text ever reaches the command line
//! other than the input file paths themselves.
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::record::SplitLabel;

/// File name Sage writes when run with `--parquet`.
pub const RESULTS_FILE: &str = "results.sage.parquet";

/// Locations Sage needs and writes to.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// The `sage` executable.
    pub sage_bin: PathBuf,
    /// Sage JSON search parameters.
    pub sage_config: PathBuf,
    /// Protein database passed with `--fasta`.
    pub fasta: PathBuf,
    /// Parent of the per-split output directories.
    pub results_root: PathBuf,
    /// Directory for `sage-<split>.log` files.
    pub log_dir: PathBuf,
}

#[derive(Clone, Debug)]
struct SplitTarget {
    output_dir: PathBuf,
    result: PathBuf,
    log: PathBuf,
}

/// Runs Sage for one split at a time.
#[derive(Clone, Debug)]
pub struct SageRunner {
    config: SearchConfig,
    targets: [SplitTarget; 3],
}

impl SageRunner {
    pub fn new(config: SearchConfig) -> Self {
        let targets = SplitLabel::ALL.map(|label| {
            let output_dir = config.results_root.join(label.as_str());
            SplitTarget {
                result: output_dir.join(RESULTS_FILE),
                output_dir,
                log: config.log_dir.join(format!("sage-{}.log", label.as_str())),
            }
        });
        Self { config, targets }
    }

    pub fn config(&self) -> &SearchConfig { &self.config }

    fn target(&self, label: SplitLabel) -> &SplitTarget { &self.targets[label.index()] }

    /// Where the result artifact for `label` is (or will be) written.
    pub fn result_path(&self, label: SplitLabel) -> &Path { &self.target(label).result }

    /// Where Sage's stderr for `label` is written.
    pub fn log_path(&self, label: SplitLabel) -> &Path { &self.target(label).log }

    /// Arguments passed to Sage for `label`, excluding the input files.
    fn base_args(&self, label: SplitLabel) -> Vec<&OsStr> {
        vec![
            OsStr::new("--parquet"),
            OsStr::new("--output_directory"),
            self.target(label).output_dir.as_os_str(),
            OsStr::new("--fasta"),
            self.config.fasta.as_os_str(),
            self.config.sage_config.as_os_str(),
        ]
    }

    /// Search `files` for `label`, unless a previous result exists.
    pub fn run_search<P: AsRef<Path>>(&self, label: SplitLabel, files: &[P]) -> Result<PathBuf> {
        let target = self.target(label);
        if target.result.exists() {
            info!("Using previous search results for {} split.", label);
            return Ok(target.result.clone());
        }

        fs::create_dir_all(&target.output_dir)?;
        fs::create_dir_all(&self.config.log_dir)?;
        let log = File::create(&target.log)?;

        info!(
            "Searching {} split (see {} for progress)...",
            label,
            target.log.display()
        );
        let mut cmd = Command::new(&self.config.sage_bin);
        cmd.args(self.base_args(label))
            .args(files.iter().map(AsRef::<Path>::as_ref))
            .stdout(Stdio::null())
            .stderr(Stdio::from(log));
        debug!("{:?}", cmd);

        let status = cmd.status()?;
        if !status.success() {
            return Err(Error::SearchFailed { split: label.as_str(), status, log: target.log.clone() });
        }
        Ok(target.result.clone())
    }

    /// Like [`run_search`](Self::run_search) for a label given as text.
    ///
    /// Anything other than `train`, `valid` or `test` is rejected before a
    /// process is spawned.
    pub fn run_search_named<P: AsRef<Path>>(&self, label: &str, files: &[P]) -> Result<PathBuf> {
        let label: SplitLabel = label.parse()?;
        self.run_search(label, files)
    }
}
