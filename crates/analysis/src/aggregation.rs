//! Portfolio statistics across a record set.
//!
//! Everything here is recomputed from the records on each call. The bidder
//! ledger is folded into a map local to the call, so concurrent calls over
//! different record sets never share state.

use bidtab_core::{Amount, BidRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Aggregate history of one bidder across all records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderLedgerEntry {
    pub name: String,
    pub bid_count: u32,
    /// Contracts on which this bidder had the lowest amount (ties included).
    pub win_count: u32,
    pub total_bid_amount: Amount,
    pub avg_bid_amount: Amount,
}

impl BidderLedgerEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bid_count: 0,
            win_count: 0,
            total_bid_amount: 0.0,
            avg_bid_amount: 0.0,
        }
    }

    /// Fraction of bids that were wins (0-1).
    pub fn win_rate(&self) -> f64 {
        if self.bid_count > 0 {
            self.win_count as f64 / self.bid_count as f64
        } else {
            0.0
        }
    }
}

/// Cross-record aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStatistics {
    /// Mean engineer estimate.
    pub avg_engineer_estimate: Amount,
    /// Mean lowest bid.
    pub avg_lowest_bid: Amount,
    /// Mean of each record's own percentage difference (not dollar-weighted).
    pub avg_diff_from_estimate: f64,
    /// Sum of engineer estimates.
    pub total_estimate_value: Amount,
    /// Sum of lowest bids.
    pub total_bid_value: Amount,
    /// Number of submitted bids across all records.
    pub total_bidders: usize,
    /// Distinct counties, sorted.
    pub counties_covered: Vec<String>,
    /// Distinct project types, sorted.
    pub project_types: Vec<String>,
    /// Bidder ledger: most wins first, then most bids, then first seen.
    pub bidder_stats: Vec<BidderLedgerEntry>,
}

impl PortfolioStatistics {
    /// The first `n` ledger entries.
    pub fn top_bidders(&self, n: usize) -> &[BidderLedgerEntry] {
        &self.bidder_stats[..n.min(self.bidder_stats.len())]
    }

    /// Ledger entry for a bidder name.
    pub fn bidder(&self, name: &str) -> Option<&BidderLedgerEntry> {
        self.bidder_stats.iter().find(|entry| entry.name == name)
    }
}

/// Compute portfolio statistics. An empty input yields all-zero statistics.
pub fn summarize(records: &[BidRecord]) -> PortfolioStatistics {
    if records.is_empty() {
        return PortfolioStatistics::default();
    }

    let n = records.len() as f64;
    let total_estimate_value: Amount = records.iter().map(|r| r.engineer_estimate()).sum();
    let total_bid_value: Amount = records.iter().map(|r| r.lowest_bid()).sum();
    let total_diff: f64 = records.iter().map(|r| r.diff_from_estimate()).sum();
    let total_bidders = records.iter().map(|r| r.bidders().len()).sum();

    let counties_covered = distinct(records.iter().map(|r| r.county()));
    let project_types = distinct(records.iter().map(|r| r.project_type()));

    let bidder_stats = build_ledger(records);

    debug!(
        records = records.len(),
        bidders = bidder_stats.len(),
        "summarized portfolio"
    );

    PortfolioStatistics {
        avg_engineer_estimate: total_estimate_value / n,
        avg_lowest_bid: total_bid_value / n,
        avg_diff_from_estimate: total_diff / n,
        total_estimate_value,
        total_bid_value,
        total_bidders,
        counties_covered,
        project_types,
        bidder_stats,
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Fold every (record, bidder) pair into per-name ledger entries.
pub fn build_ledger(records: &[BidRecord]) -> Vec<BidderLedgerEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<BidderLedgerEntry> = Vec::new();

    for record in records {
        for bidder in record.bidders() {
            let slot = *index.entry(bidder.name.as_str()).or_insert_with(|| {
                entries.push(BidderLedgerEntry::new(&bidder.name));
                entries.len() - 1
            });

            let entry = &mut entries[slot];
            entry.bid_count += 1;
            entry.total_bid_amount += bidder.amount;
            if record.is_winning_bid(bidder) {
                entry.win_count += 1;
            }
        }
    }

    for entry in &mut entries {
        entry.avg_bid_amount = entry.total_bid_amount / entry.bid_count as f64;
    }

    // Stable: equal (wins, bids) keep first-seen order.
    entries.sort_by(|a, b| {
        b.win_count
            .cmp(&a.win_count)
            .then_with(|| b.bid_count.cmp(&a.bid_count))
    });

    entries
}
