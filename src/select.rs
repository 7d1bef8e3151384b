//! Seeded selection of spectrum files into train/valid/test splits.
//!
//! The metadata table lists every candidate file as `<accession>/<filename>`.
//! Selection keeps **one file per accession**, so no dataset contributes to
//! more than one split:
//!
//! 1. shuffle all rows with an RNG seeded from `seed`, keep the first row per
//!    accession (a seeded pick among that accession's files);
//! 2. shuffle the survivors again with a fresh RNG from the same `seed`;
//! 3. slice contiguous windows of `train`, `valid`, `test` rows from the front.
//!
//! Asking for more files than there are distinct accessions is not an error;
//! the later splits simply come back short.
//!
//! # Examples
//! ```
//! use mskb_split::record::SplitSizes;
//! use mskb_split::select::select_splits;
//! let ids = ["MSV1/a.mzML", "MSV1/b.mzML", "MSV2/c.mzML", "MSV3/d.mzML"];
//! let splits = select_splits(ids, SplitSizes::new(1, 1, 1), 7).unwrap();
//! assert_eq!(splits.len(), 3);
//! ```
use std::collections::HashSet;
use std::path::Path;

use log::{info, warn};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::record::{FileRecord, SplitAssignment, SplitLabel, SplitSizes};

/// Column of the MassIVE-KB file table holding `<accession>/<filename>`.
pub const SPECTRUM_COLUMN: &str = "spectrum_filename";

/// Split `"<accession>/<filename>"` on its first `/`.
pub fn parse_identifier(id: &str) -> Result<FileRecord> {
    match id.split_once('/') {
        Some((acc, file)) if !acc.is_empty() && !file.is_empty() => Ok(FileRecord::new(acc, file)),
        _ => Err(Error::MalformedIdentifier(id.to_string())),
    }
}

/// Read the `spectrum_filename` column of a tab-separated table.
///
/// All columns are read as strings; empty cells are skipped.
pub fn read_identifiers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let p = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|o| o.with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(p.to_path_buf()))?
        .finish()?;

    let col = df.column(SPECTRUM_COLUMN).map_err(|_| Error::MissingColumn {
        column: SPECTRUM_COLUMN,
        path: p.to_path_buf(),
    })?;
    let ids = col.str()?.into_iter().flatten().map(str::to_owned).collect();
    Ok(ids)
}

/// Deterministically partition one file per accession into three splits.
pub fn select_splits<I, S>(identifiers: I, sizes: SplitSizes, seed: u64) -> Result<SplitAssignment>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rows = identifiers
        .into_iter()
        .map(|id| parse_identifier(id.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    rows.shuffle(&mut StdRng::seed_from_u64(seed));
    let mut seen = HashSet::new();
    let mut unique: Vec<FileRecord> = rows
        .into_iter()
        .filter(|r| seen.insert(r.accession.clone()))
        .collect();
    unique.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut out = SplitAssignment::default();
    let mut start = 0usize;
    for label in SplitLabel::ALL {
        let end = start.saturating_add(sizes.get(label)).min(unique.len());
        out.get_mut(label).extend_from_slice(&unique[start..end]);
        start = end;
    }
    Ok(out)
}

/// Read the metadata table at `path` and select splits from it.
pub fn select_files<P: AsRef<Path>>(path: P, sizes: SplitSizes, seed: u64) -> Result<SplitAssignment> {
    let ids = read_identifiers(path.as_ref())?;
    let splits = select_splits(&ids, sizes, seed)?;
    info!(
        "Selected {} of {} listed files (seed {}): train={} valid={} test={}",
        splits.len(),
        ids.len(),
        seed,
        splits.train.len(),
        splits.valid.len(),
        splits.test.len(),
    );
    if splits.len() < sizes.total() {
        warn!(
            "Requested {} files but only {} distinct accessions are available; splits were truncated.",
            sizes.total(),
            splits.len(),
        );
    }
    Ok(splits)
}

#[cfg(test)]
mod select_tests {
    use super::*;
    use std::io::Write;

    fn five_accessions() -> Vec<String> {
        // 5 distinct accessions, some with several files.
        vec![
            "MSV000001/a.mzML", "MSV000001/b.mzML", "MSV000002/c.mzML",
            "MSV000003/ccms_peak/d.mzML", "MSV000003/ccms_peak/e.mzML", "MSV000003/f.mzML",
            "MSV000004/g.mzML", "MSV000005/h.mzML", "MSV000005/i.mzML",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn accessions(records: &[FileRecord]) -> HashSet<&str> {
        records.iter().map(|r| r.accession.as_str()).collect()
    }

    #[test]
    fn identifier_splits_on_first_slash_only() {
        let r = parse_identifier("MSV000079514/ccms_peak/RAW/run01.mzML").unwrap();
        assert_eq!(r.accession, "MSV000079514");
        assert_eq!(r.filename, "ccms_peak/RAW/run01.mzML");
    }

    #[test]
    fn malformed_identifiers_are_rejected() {
        for bad in ["no-slash.mzML", "/file.mzML", "MSV1/", ""] {
            assert!(matches!(parse_identifier(bad), Err(Error::MalformedIdentifier(_))), "{bad}");
        }
        assert!(select_splits(["MSV1/a.mzML", "broken"], SplitSizes::new(1, 0, 0), 1).is_err());
    }

    #[test]
    fn same_seed_gives_same_assignment() {
        let ids = five_accessions();
        let a = select_splits(&ids, SplitSizes::new(2, 1, 1), 7).unwrap();
        let b = select_splits(&ids, SplitSizes::new(2, 1, 1), 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn requested_sizes_are_met_when_enough_accessions() {
        let s = select_splits(five_accessions(), SplitSizes::new(2, 1, 1), 7).unwrap();
        assert_eq!((s.train.len(), s.valid.len(), s.test.len()), (2, 1, 1));
    }

    #[test]
    fn splits_are_disjoint_by_accession() {
        for seed in 0..20 {
            let s = select_splits(five_accessions(), SplitSizes::new(2, 2, 1), seed).unwrap();
            let (tr, va, te) = (accessions(&s.train), accessions(&s.valid), accessions(&s.test));
            assert!(tr.is_disjoint(&va) && tr.is_disjoint(&te) && va.is_disjoint(&te), "seed {seed}");
            assert_eq!(tr.len() + va.len() + te.len(), s.len());
        }
    }

    #[test]
    fn oversized_request_is_truncated_without_error() {
        let s = select_splits(five_accessions(), SplitSizes::new(3, 3, 3), 42).unwrap();
        assert_eq!(s.len(), 5);
        assert_eq!((s.train.len(), s.valid.len(), s.test.len()), (3, 2, 0));
    }

    #[test]
    fn each_split_is_bounded_by_its_request() {
        for (n_train, n_valid, n_test) in [(0, 0, 0), (1, 0, 4), (0, 5, 0), (4, 4, 4)] {
            let sizes = SplitSizes::new(n_train, n_valid, n_test);
            let s = select_splits(five_accessions(), sizes, 3).unwrap();
            for label in SplitLabel::ALL {
                assert!(s.get(label).len() <= sizes.get(label));
            }
            assert!(s.len() <= 5);
        }
    }

    #[test]
    fn every_selected_record_comes_from_the_table() {
        let ids = five_accessions();
        let s = select_splits(&ids, SplitSizes::new(5, 0, 0), 11).unwrap();
        for (_, records) in s.iter() {
            for r in records {
                assert!(ids.contains(&r.to_string()));
            }
        }
    }

    #[test]
    fn different_seeds_reorder_a_large_table() {
        let ids: Vec<String> = (0..50).map(|i| format!("MSV{i:06}/run.mzML")).collect();
        let a = select_splits(&ids, SplitSizes::new(50, 0, 0), 1).unwrap();
        let b = select_splits(&ids, SplitSizes::new(50, 0, 0), 2).unwrap();
        assert_ne!(a.train, b.train);
        assert_eq!(accessions(&a.train), accessions(&b.train));
    }

    #[test]
    fn reads_spectrum_column_from_tsv() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "dataset\tspectrum_filename\tcharge").unwrap();
        writeln!(f, "x\tMSV000001/a.mzML\t2").unwrap();
        writeln!(f, "y\tMSV000002/peak/b.mzML\t3").unwrap();
        f.flush().unwrap();

        let ids = read_identifiers(f.path()).unwrap();
        assert_eq!(ids, vec!["MSV000001/a.mzML", "MSV000002/peak/b.mzML"]);

        let s = select_files(f.path(), SplitSizes::new(1, 1, 1), 42).unwrap();
        assert_eq!((s.train.len(), s.valid.len(), s.test.len()), (1, 1, 0));
    }

    #[test]
    fn missing_spectrum_column_is_reported() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "dataset\tfile").unwrap();
        writeln!(f, "x\tMSV000001/a.mzML").unwrap();
        f.flush().unwrap();
        assert!(matches!(read_identifiers(f.path()), Err(Error::MissingColumn { .. })));
    }
}
