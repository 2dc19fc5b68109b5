//! Core data types for the bid-tabulation engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency amount in dollars.
pub type Amount = f64;

/// Sentinel used for metadata fields that were not found in a bid file.
pub const UNKNOWN: &str = "Unknown";

/// Round to two decimal places (cents / hundredths of a percent).
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Signed percentage difference of `value` from `base`, rounded to two
/// decimals. Returns `None` when `base` is zero.
#[inline]
pub fn percent_diff(value: Amount, base: Amount) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some(round2((value - base) / base * 100.0))
    }
}

/// Build a record id from the source filename and the parse time.
pub fn make_record_id(filename: &str, parsed_at: DateTime<Utc>) -> String {
    format!("{}-{}", filename, parsed_at.timestamp_millis())
}

/// One bid submitted by one company on one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bidder {
    /// Sequence tag taken from the bidder line (e.g. "1").
    pub number: String,
    /// Company name.
    pub name: String,
    /// Bid amount (non-negative).
    pub amount: Amount,
}

impl Bidder {
    pub fn new(number: impl Into<String>, name: impl Into<String>, amount: Amount) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            amount,
        }
    }
}

/// Letting date of a contract.
///
/// Serialized as `YYYY-MM-DD`, or `"Unknown"` when the file had no usable date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum BidDate {
    Known(NaiveDate),
    #[default]
    Unknown,
}

impl BidDate {
    /// Build a date, falling back to `Unknown` for impossible calendar values.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(BidDate::Known)
            .unwrap_or(BidDate::Unknown)
    }

    /// The calendar date, if known.
    pub fn known(self) -> Option<NaiveDate> {
        match self {
            BidDate::Known(date) => Some(date),
            BidDate::Unknown => None,
        }
    }
}

impl fmt::Display for BidDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidDate::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            BidDate::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl From<BidDate> for String {
    fn from(date: BidDate) -> Self {
        date.to_string()
    }
}

impl From<String> for BidDate {
    fn from(text: String) -> Self {
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(BidDate::Known)
            .unwrap_or(BidDate::Unknown)
    }
}

/// Extracted fields of a bid record, before derived values are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub id: String,
    pub filename: String,
    pub county: String,
    pub project_type: String,
    pub date: BidDate,
    pub contract_number: String,
    pub engineer_estimate: Amount,
    pub bidders: Vec<Bidder>,
}

/// One parsed contract.
///
/// `lowest_bid` and `diff_from_estimate` are derived from the bidders and the
/// estimate when the record is built, and recomputed when it is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RecordFields")]
pub struct BidRecord {
    id: String,
    filename: String,
    county: String,
    project_type: String,
    date: BidDate,
    contract_number: String,
    engineer_estimate: Amount,
    bidders: Vec<Bidder>,
    lowest_bid: Amount,
    diff_from_estimate: f64,
}

impl From<RecordFields> for BidRecord {
    fn from(fields: RecordFields) -> Self {
        let lowest_bid = fields
            .bidders
            .iter()
            .map(|b| b.amount)
            .reduce(f64::min)
            .unwrap_or(0.0);

        // A missing estimate (0) yields no difference rather than a division by zero.
        let diff_from_estimate = if fields.engineer_estimate > 0.0 {
            percent_diff(lowest_bid, fields.engineer_estimate).unwrap_or(0.0)
        } else {
            0.0
        };

        Self {
            id: fields.id,
            filename: fields.filename,
            county: fields.county,
            project_type: fields.project_type,
            date: fields.date,
            contract_number: fields.contract_number,
            engineer_estimate: fields.engineer_estimate,
            bidders: fields.bidders,
            lowest_bid,
            diff_from_estimate,
        }
    }
}

impl BidRecord {
    /// Build a record from extracted fields.
    pub fn new(fields: RecordFields) -> Self {
        fields.into()
    }

    /// A copy of this record under a different id.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn county(&self) -> &str {
        &self.county
    }

    pub fn project_type(&self) -> &str {
        &self.project_type
    }

    pub fn date(&self) -> BidDate {
        self.date
    }

    pub fn contract_number(&self) -> &str {
        &self.contract_number
    }

    /// Engineer's estimate; `0` when the file had none.
    pub fn engineer_estimate(&self) -> Amount {
        self.engineer_estimate
    }

    pub fn has_estimate(&self) -> bool {
        self.engineer_estimate > 0.0
    }

    /// Bidders in file order.
    pub fn bidders(&self) -> &[Bidder] {
        &self.bidders
    }

    /// Minimum bid amount, or `0` with no bidders.
    pub fn lowest_bid(&self) -> Amount {
        self.lowest_bid
    }

    /// Percent by which the lowest bid deviates from the estimate.
    pub fn diff_from_estimate(&self) -> f64 {
        self.diff_from_estimate
    }

    /// Whether `bidder` submitted the lowest amount on this contract.
    /// Tied low bids all count.
    pub fn is_winning_bid(&self, bidder: &Bidder) -> bool {
        !self.bidders.is_empty() && bidder.amount == self.lowest_bid
    }

    /// Bidders tied at the lowest amount.
    pub fn winners(&self) -> impl Iterator<Item = &Bidder> {
        self.bidders.iter().filter(move |b| self.is_winning_bid(b))
    }
}

#[cfg(test)]
pub(crate) fn sample_fields(id: &str, estimate: Amount, amounts: &[Amount]) -> RecordFields {
    RecordFields {
        id: id.to_string(),
        filename: format!("{id}.TXT"),
        county: "HARRIS".to_string(),
        project_type: "BRIDGE REPAIR".to_string(),
        date: BidDate::from_ymd(2024, 3, 15),
        contract_number: "CSJ-100".to_string(),
        engineer_estimate: estimate,
        bidders: amounts
            .iter()
            .enumerate()
            .map(|(i, &a)| Bidder::new(format!("{}A", i + 1), format!("Bidder {}", i + 1), a))
            .collect(),
    }
}
