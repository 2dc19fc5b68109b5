//! Snapshot export for the bid-tabulation engine.
//!
//! A snapshot bundles the record set with its portfolio statistics and the
//! export time, serialized as one JSON document.

pub mod snapshot;

pub use snapshot::{
    build_snapshot, build_snapshot_at, default_export_filename, parse_snapshot, read_snapshot,
    to_json, write_snapshot, Snapshot,
};
