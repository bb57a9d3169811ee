//! A page of records plus the server-reported total.

use serde::{Deserialize, Serialize};

use crate::collection::{Identified, find_by_id};

/// Records returned by one fetch.
///
/// `record_count` is the total reported by the server, not `records.len()`,
/// whenever paging happens server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet<T, X = ()> {
    pub record_count: usize,
    pub records: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<X>,
}

impl<T, X> Default for RecordSet<T, X> {
    fn default() -> Self {
        Self {
            record_count: 0,
            records: Vec::new(),
            data: None,
        }
    }
}

impl<T, X> RecordSet<T, X> {
    /// A complete collection: the count equals the number of records.
    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            record_count: records.len(),
            records,
            data: None,
        }
    }

    /// One page out of a larger server-side total.
    pub fn page(records: Vec<T>, record_count: usize) -> Self {
        Self {
            record_count,
            records,
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: X) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True while fewer records are held than the server reported.
    pub fn is_partial(&self) -> bool {
        self.records.len() < self.record_count
    }

    /// Append the records of a follow-up fetch, taking over its count and metadata.
    pub fn extend_with(&mut self, next: RecordSet<T, X>) {
        self.records.extend(next.records);
        self.record_count = next.record_count.max(self.records.len());
        if next.data.is_some() {
            self.data = next.data;
        }
    }
}

impl<T: Identified, X> RecordSet<T, X> {
    pub fn find(&self, id: &T::Id) -> Option<&T> {
        find_by_id(&self.records, id)
    }
}
