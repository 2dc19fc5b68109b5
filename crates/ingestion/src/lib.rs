//! Bid file ingestion for the bid-tabulation engine.
//!
//! This crate handles:
//! - Field extraction from one bid tabulation text file
//! - Per-field default reporting
//! - Parallel parsing of many files from the filesystem

pub mod parser;
pub mod batch;

pub use parser::{BidFileParser, DefaultReason, FieldDefault, ParseReport, RecordField};
pub use batch::{collect_bid_files, into_record_set, parse_files, read_bid_file, FileOutcome};
