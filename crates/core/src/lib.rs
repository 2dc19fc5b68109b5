//! Core types and configuration for the bid-tabulation engine.
//!
//! This crate provides shared types used across all other crates:
//! - Bid records and bidders
//! - The record set collection
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod record_set;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use record_set::RecordSet;
pub use types::*;
