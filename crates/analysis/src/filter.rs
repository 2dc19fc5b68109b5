//! Filtering and ordering of bid records for display.
//!
//! Works on a borrowed snapshot of the record set and never mutates it.
//! Sorting is stable in both directions: records that compare equal keep
//! their input order.

use bidtab_core::config::ViewConfig;
use bidtab_core::{BidDate, BidRecord, Error, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Substring predicates over a record. `None` or an empty string is inactive;
/// all active predicates must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    /// Case-insensitive substring of the county.
    pub county: Option<String>,
    /// Case-insensitive substring of the project type.
    pub project_type: Option<String>,
    /// Case-sensitive substring of the contract number.
    pub contract_number: Option<String>,
    /// Case-insensitive substring of any bidder's name.
    pub bidder_name: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn with_project_type(mut self, project_type: impl Into<String>) -> Self {
        self.project_type = Some(project_type.into());
        self
    }

    pub fn with_contract_number(mut self, contract_number: impl Into<String>) -> Self {
        self.contract_number = Some(contract_number.into());
        self
    }

    pub fn with_bidder_name(mut self, bidder_name: impl Into<String>) -> Self {
        self.bidder_name = Some(bidder_name.into());
        self
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        active(&self.county).is_none()
            && active(&self.project_type).is_none()
            && active(&self.contract_number).is_none()
            && active(&self.bidder_name).is_none()
    }

    /// Check a record against every active predicate.
    pub fn matches(&self, record: &BidRecord) -> bool {
        if let Some(county) = active(&self.county) {
            if !contains_ignore_case(record.county(), county) {
                return false;
            }
        }

        if let Some(project_type) = active(&self.project_type) {
            if !contains_ignore_case(record.project_type(), project_type) {
                return false;
            }
        }

        if let Some(contract_number) = active(&self.contract_number) {
            if !record.contract_number().contains(contract_number) {
                return false;
            }
        }

        if let Some(bidder_name) = active(&self.bidder_name) {
            let needle = bidder_name.to_lowercase();
            if !record
                .bidders()
                .iter()
                .any(|b| b.name.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        true
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Sortable record attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Date,
    County,
    ProjectType,
    ContractNumber,
    EngineerEstimate,
    LowestBid,
    DiffFromEstimate,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Date,
        SortKey::County,
        SortKey::ProjectType,
        SortKey::ContractNumber,
        SortKey::EngineerEstimate,
        SortKey::LowestBid,
        SortKey::DiffFromEstimate,
    ];

    /// Field name as used in the export format.
    pub fn name(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::County => "county",
            SortKey::ProjectType => "projectType",
            SortKey::ContractNumber => "contractNumber",
            SortKey::EngineerEstimate => "engineerEstimate",
            SortKey::LowestBid => "lowestBid",
            SortKey::DiffFromEstimate => "diffFromEstimate",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    /// Accepts the camelCase field name or its snake_case / kebab-case form.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        SortKey::ALL
            .into_iter()
            .find(|key| key.name().to_lowercase() == normalized)
            .ok_or_else(|| Error::config(format!("unknown sort key '{s}'")))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[inline]
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(Error::config(format!("unknown sort direction '{s}'"))),
        }
    }
}

/// Sort key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn descending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    /// Default ordering from the view configuration.
    pub fn from_config(config: &ViewConfig) -> Result<Self> {
        let direction = if config.descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Ok(Self::new(config.sort_key.parse()?, direction))
    }

    /// Compare two records under this ordering.
    pub fn compare(&self, a: &BidRecord, b: &BidRecord) -> Ordering {
        let direction = self.direction;
        match self.key {
            SortKey::Date => compare_dates(a.date(), b.date(), direction),
            SortKey::County => direction.apply(locale_cmp(a.county(), b.county())),
            SortKey::ProjectType => {
                direction.apply(locale_cmp(a.project_type(), b.project_type()))
            }
            SortKey::ContractNumber => {
                direction.apply(locale_cmp(a.contract_number(), b.contract_number()))
            }
            SortKey::EngineerEstimate => {
                direction.apply(cmp_amount(a.engineer_estimate(), b.engineer_estimate()))
            }
            SortKey::LowestBid => direction.apply(cmp_amount(a.lowest_bid(), b.lowest_bid())),
            SortKey::DiffFromEstimate => {
                direction.apply(cmp_amount(a.diff_from_estimate(), b.diff_from_estimate()))
            }
        }
    }
}

#[inline]
fn cmp_amount(a: f64, b: f64) -> Ordering {
    OrderedFloat(a).cmp(&OrderedFloat(b))
}

/// Known dates in the requested direction; unknown dates always last.
fn compare_dates(a: BidDate, b: BidDate, direction: SortDirection) -> Ordering {
    match (a.known(), b.known()) {
        (Some(x), Some(y)) => direction.apply(x.cmp(&y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Dictionary-style text ordering: letters compare case-insensitively first,
/// then lowercase before uppercase at the first case difference.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded
        .then_with(|| {
            a.chars()
                .zip(b.chars())
                .find(|(x, y)| x != y)
                .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.cmp(b))
}

/// Filter-and-sort view over a record set.
#[derive(Debug, Clone, Default)]
pub struct FilterSortEngine {
    criteria: FilterCriteria,
    sort: SortSpec,
}

impl FilterSortEngine {
    pub fn new(criteria: FilterCriteria, sort: SortSpec) -> Self {
        Self { criteria, sort }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    /// Reset all filters.
    pub fn reset_criteria(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    /// Select a sort key. Selecting the current key flips the direction;
    /// a new key starts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = if self.sort.key == key {
            let direction = match self.sort.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
            SortSpec::new(key, direction)
        } else {
            SortSpec::ascending(key)
        };
    }

    /// Matching records, ordered, borrowed from the input.
    pub fn apply_refs<'a>(&self, records: &'a [BidRecord]) -> Vec<&'a BidRecord> {
        let mut selected: Vec<&BidRecord> = records
            .iter()
            .filter(|record| self.criteria.matches(record))
            .collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));

        debug!(
            total = records.len(),
            selected = selected.len(),
            key = %self.sort.key,
            "applied filter and sort"
        );
        selected
    }

    /// Matching records, ordered, as owned copies.
    pub fn apply(&self, records: &[BidRecord]) -> Vec<BidRecord> {
        self.apply_refs(records).into_iter().cloned().collect()
    }
}
