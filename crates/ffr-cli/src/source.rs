//! In-memory record source standing in for a list endpoint.
//!
//! The source answers a [`FetchRequest`] the way a paging REST endpoint
//! would: it filters, searches and sorts the whole collection, then returns
//! the requested page together with the total. Fetch-all requests get every
//! matching record and leave search and sort to the list model.

use std::borrow::Cow;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::future::{self, Future};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use ffr_model::{
    FetchError, FieldAccess, Identified, RecordSet, collection_where, field_union, json_text,
    page_list, search_list, sort_list,
};
use ffr_store::{Fetch, FetchRequest};

/// Exact-match conditions, field name to value text.
pub type Filter = BTreeMap<String, String>;

/// A JSON object with an `id` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Value,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Identified for Record {
    type Id = Value;

    fn id(&self) -> &Value {
        &self.id
    }
}

impl FieldAccess for Record {
    fn field_text(&self, name: &str) -> Option<Cow<'_, str>> {
        if name == "id" {
            return json_text(&self.id);
        }
        json_text(self.fields.get(name)?)
    }

    fn field_names(&self) -> Vec<String> {
        std::iter::once("id".to_string())
            .chain(self.fields.keys().cloned())
            .collect()
    }
}

// Either a bare array or a `{ recordCount, records }` document.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    List(Vec<Record>),
    Set(RecordSet<Record>),
}

/// Read records from a JSON file.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read records {}", path.display()))?;
    parse_records(&text).with_context(|| format!("parse records {}", path.display()))
}

pub fn parse_records(text: &str) -> Result<Vec<Record>> {
    let file: RecordFile = serde_json::from_str(text)?;
    Ok(match file {
        RecordFile::List(records) => records,
        RecordFile::Set(set) => set.records,
    })
}

/// Field names in first-seen order, `id` first.
pub fn field_names(records: &[Record]) -> Vec<String> {
    if records.is_empty() {
        return vec!["id".to_string()];
    }
    field_union(records)
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(field, expected)| record.field_text(field).is_some_and(|text| text == *expected))
}

/// Serves fetches from records held in memory.
#[derive(Debug, Clone)]
pub struct JsonSource {
    records: Rc<[Record]>,
    search_fields: Vec<String>,
    failures_left: Rc<Cell<u32>>,
}

impl JsonSource {
    pub fn new(records: Vec<Record>, search_fields: Vec<String>) -> Self {
        Self {
            records: records.into(),
            search_fields,
            failures_left: Rc::new(Cell::new(0)),
        }
    }

    /// Fail the next `count` fetches with a transport error.
    #[must_use]
    pub fn with_simulated_failures(self, count: u32) -> Self {
        self.failures_left.set(count);
        self
    }

    pub fn answer(
        &self,
        request: &FetchRequest<Filter>,
    ) -> std::result::Result<RecordSet<Record>, FetchError> {
        let left = self.failures_left.get();
        if left > 0 {
            self.failures_left.set(left - 1);
            return Err(FetchError::transport(format!(
                "simulated failure on attempt {}",
                request.attempt
            )));
        }

        let matching = collection_where(&self.records, |r| matches_filter(r, &request.query.filter));
        let Some(paging) = request.paging else {
            debug!(records = matching.len(), "serving whole collection");
            return Ok(RecordSet::from_records(matching));
        };

        let searched = search_list(
            &matching,
            request.query.search.as_deref(),
            &self.search_fields,
        );
        let sorted = match &request.query.sort {
            Some(sort) => Cow::Owned(sort_list(&searched, sort)),
            None => searched,
        };
        let page = page_list(&sorted, &paging);
        debug!(
            page = paging.page_index(),
            records = page.len(),
            total = sorted.len(),
            "serving page"
        );
        Ok(RecordSet::page(page.to_vec(), sorted.len()))
    }
}

impl Fetch<Record, Filter> for JsonSource {
    fn fetch(
        &self,
        request: FetchRequest<Filter>,
    ) -> impl Future<Output = std::result::Result<RecordSet<Record>, FetchError>> + 'static {
        future::ready(self.answer(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffr_model::{Paging, QueryState, SortSpec, fingerprint_str};
    use serde_json::json;

    fn records() -> Vec<Record> {
        parse_records(
            r#"[
                {"id": 1, "name": "web-1", "ns": "default"},
                {"id": 2, "name": "db-1", "ns": "storage"},
                {"id": 3, "name": "web-2", "ns": "default"}
            ]"#,
        )
        .unwrap()
    }

    fn request(query: QueryState<Filter>, paging: Option<Paging>) -> FetchRequest<Filter> {
        FetchRequest {
            fingerprint: fingerprint_str("test"),
            query,
            paging,
            data: None,
            origin_len: 0,
            attempt: 1,
        }
    }

    #[test]
    fn test_parse_both_layouts() {
        assert_eq!(records().len(), 3);
        let set = parse_records(r#"{"recordCount": 9, "records": [{"id": "a"}]}"#).unwrap();
        assert_eq!(set[0].id, json!("a"));
    }

    #[test]
    fn test_field_names_in_order() {
        assert_eq!(field_names(&records()), vec!["id", "name", "ns"]);
    }

    #[test]
    fn test_page_reports_filtered_total() {
        let source = JsonSource::new(records(), vec!["name".into()]);
        let mut filter = Filter::new();
        filter.insert("ns".into(), "default".into());
        let query = QueryState::new(filter).with_sort(SortSpec::desc("name"));
        let set = source
            .answer(&request(query, Some(Paging::new(1, 1).unwrap())))
            .unwrap();
        assert_eq!(set.record_count, 2);
        assert_eq!(set.records[0].id, json!(3));
    }

    #[test]
    fn test_fetch_all_ignores_search() {
        let source = JsonSource::new(records(), vec!["name".into()]);
        let query = QueryState::new(Filter::new()).with_search("db".to_string());
        let set = source.answer(&request(query, None)).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_simulated_failures_run_out() {
        let source = JsonSource::new(records(), Vec::new()).with_simulated_failures(1);
        let req = request(QueryState::default(), Some(Paging::default()));
        assert!(matches!(
            source.answer(&req),
            Err(FetchError::Transport { .. })
        ));
        assert!(source.answer(&req).is_ok());
    }
}
