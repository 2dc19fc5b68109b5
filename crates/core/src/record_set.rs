//! Ordered collection of parsed records with unique ids.

use crate::types::BidRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Records in insertion order. Ids are unique within the set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<BidRecord>", into = "Vec<BidRecord>")]
pub struct RecordSet {
    records: Vec<BidRecord>,
    ids: HashSet<String>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. A colliding id is suffixed (`-2`, `-3`, ...) until unique.
    /// Returns the id the record was stored under.
    pub fn push(&mut self, record: BidRecord) -> &str {
        let record = if self.ids.contains(record.id()) {
            let base = record.id().to_string();
            let mut n = 2usize;
            let mut candidate = format!("{base}-{n}");
            while self.ids.contains(&candidate) {
                n += 1;
                candidate = format!("{base}-{n}");
            }
            record.with_id(candidate)
        } else {
            record
        };

        self.ids.insert(record.id().to_string());
        self.records.push(record);
        self.records[self.records.len() - 1].id()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&BidRecord> {
        if !self.ids.contains(id) {
            return None;
        }
        self.records.iter().find(|r| r.id() == id)
    }

    /// Remove a record by id, preserving the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<BidRecord> {
        if !self.ids.remove(id) {
            return None;
        }
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    pub fn records(&self) -> &[BidRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BidRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.ids.clear();
    }
}

impl Extend<BidRecord> for RecordSet {
    fn extend<I: IntoIterator<Item = BidRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

impl FromIterator<BidRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = BidRecord>>(iter: I) -> Self {
        let mut set = RecordSet::new();
        set.extend(iter);
        set
    }
}

impl From<Vec<BidRecord>> for RecordSet {
    fn from(records: Vec<BidRecord>) -> Self {
        records.into_iter().collect()
    }
}

impl From<RecordSet> for Vec<BidRecord> {
    fn from(set: RecordSet) -> Self {
        set.records
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a BidRecord;
    type IntoIter = std::slice::Iter<'a, BidRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
