//! Bid statistics for a single project.

use bidtab_core::{percent_diff, round2, Amount, BidRecord};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// One bidder compared against the low bid and the estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidComparison {
    pub number: String,
    pub name: String,
    pub amount: Amount,
    pub is_lowest: bool,
    /// Percent above the lowest bid; `None` when the lowest bid is zero.
    pub diff_from_lowest: Option<f64>,
    /// Percent from the estimate; `None` when there is no estimate.
    pub diff_from_estimate: Option<f64>,
}

/// Detail statistics for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub bid_count: usize,
    pub average_bid: Amount,
    /// Lower-middle amount for an even number of bids.
    pub median_bid: Amount,
    /// Highest minus lowest bid; zero with fewer than two bids.
    pub bid_range: Amount,
    /// Range as a percentage of the average bid; zero with fewer than two bids.
    pub bid_dispersion: f64,
    /// Bidders ordered by amount, lowest first.
    pub comparisons: Vec<BidComparison>,
}

/// Summarize the bids on one record.
pub fn summarize_project(record: &BidRecord) -> ProjectSummary {
    let bidders = record.bidders();
    let bid_count = bidders.len();

    let mut amounts: Vec<OrderedFloat<f64>> =
        bidders.iter().map(|b| OrderedFloat(b.amount)).collect();
    amounts.sort();

    let (average_bid, median_bid) = if bid_count > 0 {
        let total: f64 = amounts.iter().map(|a| a.0).sum();
        (total / bid_count as f64, amounts[(bid_count - 1) / 2].0)
    } else {
        (0.0, 0.0)
    };

    let bid_range = match (amounts.first(), amounts.last()) {
        (Some(low), Some(high)) if bid_count > 1 => high.0 - low.0,
        _ => 0.0,
    };

    let bid_dispersion = if bid_count > 1 && average_bid > 0.0 {
        round2(bid_range / average_bid * 100.0)
    } else {
        0.0
    };

    let mut comparisons: Vec<BidComparison> = bidders
        .iter()
        .map(|bidder| BidComparison {
            number: bidder.number.clone(),
            name: bidder.name.clone(),
            amount: bidder.amount,
            is_lowest: record.is_winning_bid(bidder),
            diff_from_lowest: percent_diff(bidder.amount, record.lowest_bid()),
            diff_from_estimate: percent_diff(bidder.amount, record.engineer_estimate()),
        })
        .collect();
    comparisons.sort_by_key(|c| OrderedFloat(c.amount));

    ProjectSummary {
        id: record.id().to_string(),
        bid_count,
        average_bid,
        median_bid,
        bid_range,
        bid_dispersion,
        comparisons,
    }
}
