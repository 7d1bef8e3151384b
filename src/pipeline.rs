//! End-to-end run: select, download, search, persist.
//!
//! Everything happens sequentially on the calling thread. A re-run after a
//! failure picks up where the last one stopped: cached downloads and existing
//! search results are reused.
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use crate::config::PipelineConfig;
use crate::download::Fetch;
use crate::record::{SplitAssignment, SplitLabel, SplitSizes};
use crate::search::SageRunner;
use crate::select;

/// What a completed run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub assignment: SplitAssignment,
    /// Local spectrum files per split, in assignment order.
    pub local_files: BTreeMap<SplitLabel, Vec<PathBuf>>,
    /// Sage result artifact per split.
    pub results: BTreeMap<SplitLabel, PathBuf>,
    pub splits_json: PathBuf,
}

/// Run the whole pipeline.
pub fn run<F: Fetch>(
    config: &PipelineConfig,
    sizes: SplitSizes,
    seed: u64,
    fetcher: &F,
    runner: &SageRunner,
) -> Result<PipelineOutcome> {
    let start = Instant::now();

    fs::create_dir_all(&config.cache_dir)
        .with_context(|| format!("creating {}", config.cache_dir.display()))?;
    fs::create_dir_all(&config.results_dir)
        .with_context(|| format!("creating {}", config.results_dir.display()))?;

    let assignment = select::select_files(&config.metadata, sizes, seed)
        .with_context(|| format!("selecting files from {}", config.metadata.display()))?;

    info!("Downloading selected files...");
    let mut local_files = BTreeMap::new();
    for (label, records) in assignment.iter() {
        let mut paths = Vec::with_capacity(records.len());
        for record in records {
            let p = fetcher
                .fetch(record)
                .with_context(|| format!("downloading {} for the {} split", record, label))?;
            paths.push(p);
        }
        local_files.insert(label, paths);
    }

    info!("Performing OMS searches with Sage...");
    let mut results = BTreeMap::new();
    for label in SplitLabel::ALL {
        let files = local_files.get(&label).map(Vec::as_slice).unwrap_or(&[]);
        let out = runner
            .run_search(label, files)
            .with_context(|| format!("searching the {} split", label))?;
        results.insert(label, out);
    }

    let splits_json = config.splits_path();
    fs::write(&splits_json, assignment.to_json()?)
        .with_context(|| format!("writing {}", splits_json.display()))?;

    info!("Elapsed time: {:.2} min", start.elapsed().as_secs_f64() / 60.0);
    info!("DONE!");

    Ok(PipelineOutcome { assignment, local_files, results, splits_json })
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;

    use crate::record::FileRecord;

    /// Resolves records into a fake cache and remembers the call order.
    struct FakeFetch {
        root: PathBuf,
        calls: RefCell<Vec<FileRecord>>,
    }

    impl Fetch for FakeFetch {
        fn fetch(&self, record: &FileRecord) -> crate::Result<PathBuf> {
            self.calls.borrow_mut().push(record.clone());
            Ok(self.root.join(&record.accession).join(&record.filename))
        }
    }

    fn project(root: &Path) -> PipelineConfig {
        let c = PipelineConfig::from_root(root);
        fs::create_dir_all(c.metadata.parent().unwrap()).unwrap();
        let mut tsv = String::from("spectrum_filename\tinstrument\n");
        for i in 0..6 {
            tsv.push_str(&format!("MSV{i:06}/peak/run{i}.mzML\tQE\n"));
            tsv.push_str(&format!("MSV{i:06}/peak/run{i}b.mzML\tQE\n"));
        }
        fs::write(&c.metadata, tsv).unwrap();
        // Pre-existing results: no sage process is ever spawned.
        let runner = SageRunner::new(c.search_config());
        for label in SplitLabel::ALL {
            let r = runner.result_path(label);
            fs::create_dir_all(r.parent().unwrap()).unwrap();
            fs::write(r, b"PAR1").unwrap();
        }
        c
    }

    #[test]
    fn run_downloads_in_split_order_and_writes_splits_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = project(tmp.path());
        let fetcher = FakeFetch { root: config.cache_dir.clone(), calls: RefCell::new(Vec::new()) };
        let runner = SageRunner::new(config.search_config());

        let out = run(&config, SplitSizes::new(2, 1, 1), 7, &fetcher, &runner).unwrap();

        let expected: Vec<FileRecord> = out.assignment.iter().flat_map(|(_, r)| r.to_vec()).collect();
        assert_eq!(*fetcher.calls.borrow(), expected);
        assert_eq!(out.local_files[&SplitLabel::Train].len(), 2);
        assert_eq!(out.results[&SplitLabel::Test], runner.result_path(SplitLabel::Test));

        let json = fs::read_to_string(&out.splits_json).unwrap();
        assert_eq!(json, out.assignment.to_json().unwrap());
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["train"].as_array().unwrap().len(), 2);
        assert_eq!(v["valid"][0].as_array().unwrap().len(), 2);
    }

    #[test]
    fn rerun_with_same_seed_rewrites_identical_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = project(tmp.path());
        let fetcher = FakeFetch { root: config.cache_dir.clone(), calls: RefCell::new(Vec::new()) };
        let runner = SageRunner::new(config.search_config());

        let first = run(&config, SplitSizes::new(2, 1, 1), 7, &fetcher, &runner).unwrap();
        let a = fs::read(&first.splits_json).unwrap();
        let second = run(&config, SplitSizes::new(2, 1, 1), 7, &fetcher, &runner).unwrap();
        let b = fs::read(&second.splits_json).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_metadata_is_reported_with_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = PipelineConfig::from_root(tmp.path());
        let fetcher = FakeFetch { root: config.cache_dir.clone(), calls: RefCell::new(Vec::new()) };
        let runner = SageRunner::new(config.search_config());
        let err = run(&config, SplitSizes::new(1, 1, 1), 42, &fetcher, &runner).unwrap_err();
        assert!(format!("{err:#}").contains("massivekb_v2.0.15-hcd-files.tsv"));
        assert!(fetcher.calls.borrow().is_empty());
    }
}
