//! Record analysis for the bid-tabulation engine.
//!
//! This crate handles:
//! - Filtering and sorting a record set for display
//! - Portfolio statistics and the per-bidder win/loss ledger
//! - Per-project bid statistics

pub mod filter;
pub mod aggregation;
pub mod project;

pub use filter::{FilterCriteria, FilterSortEngine, SortDirection, SortKey, SortSpec};
pub use aggregation::{summarize, BidderLedgerEntry, PortfolioStatistics};
pub use project::{summarize_project, BidComparison, ProjectSummary};
