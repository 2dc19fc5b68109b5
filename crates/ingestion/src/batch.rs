//! Batch ingestion of bid files from the filesystem.
//!
//! Files are independent, so they are read and parsed in parallel. A file
//! that cannot be read or decoded is reported on its own and never affects
//! the rest of the batch.

use crate::parser::BidFileParser;
use bidtab_core::config::ParserConfig;
use bidtab_core::{BidRecord, Error, RecordSet, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of ingesting one file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<BidRecord>,
}

/// Expand the given paths into bid files.
///
/// Directories contribute their direct children whose extension equals
/// `config.file_extension` (case-sensitive), sorted by path. Plain file paths
/// are kept as given.
pub fn collect_bid_files(paths: &[PathBuf], config: &ParserConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let entry_path = entry?.path();
                if entry_path.is_file() && has_extension(&entry_path, &config.file_extension) {
                    found.push(entry_path);
                }
            }
            found.sort();
            info!(dir = %path.display(), files = found.len(), "collected bid files");
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

/// Read and parse one file. The record's filename is the path's final component.
pub fn read_bid_file(parser: &BidFileParser, path: &Path) -> Result<BidRecord> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parser.parse_bytes(&bytes, &filename)
}

/// Parse many files in parallel. Outcomes are returned in input order.
pub fn parse_files(parser: &BidFileParser, paths: &[PathBuf]) -> Vec<FileOutcome> {
    paths
        .par_iter()
        .map(|path| FileOutcome {
            path: path.clone(),
            result: read_bid_file(parser, path),
        })
        .collect()
}

/// Collect successful outcomes into a record set and return the failures.
pub fn into_record_set(outcomes: Vec<FileOutcome>) -> (RecordSet, Vec<(PathBuf, Error)>) {
    let mut records = RecordSet::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(record) => {
                records.push(record);
            }
            Err(err) => {
                warn!(path = %outcome.path.display(), error = %err, "failed to ingest bid file");
                failures.push((outcome.path, err));
            }
        }
    }

    (records, failures)
}
