//! Running one list query end to end.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{Instrument, info, info_span};

use ffr_model::{DEFAULT_PAGE_SIZE, FetchOptions, Paging, QueryPatch, QueryState, SortSpec};
use ffr_store::{Completion, ListController, ListModel};

use crate::source::{Filter, JsonSource, Record, field_names};

/// Everything needed to run a query against a record file.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: Filter,
    pub search: Option<String>,
    /// Fields the search term is matched against. Empty means every field.
    pub search_fields: Vec<String>,
    pub sort: Option<SortSpec>,
    pub page: usize,
    pub page_size: usize,
    /// Keep paging forward up to this page after the first one loaded.
    pub through_page: Option<usize>,
    /// Identifier selected once the first page arrives.
    pub select: Option<Value>,
    pub options: FetchOptions,
    /// Fetches the source fails before answering.
    pub simulated_failures: u32,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self {
            filter: Filter::new(),
            search: None,
            search_fields: Vec::new(),
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            through_page: None,
            select: None,
            options: FetchOptions::default(),
            simulated_failures: 0,
        }
    }
}

/// Final state of a query run.
#[derive(Debug)]
pub struct QueryReport {
    pub model: ListModel<Record, Filter>,
    pub completions: Vec<Completion>,
    pub fetches: u64,
}

impl QueryReport {
    /// The last fetch for the current query failed.
    pub fn failed(&self) -> bool {
        self.model.error().is_some()
    }
}

/// Load the plan's query, page forward if asked, and wait for every fetch.
pub async fn run_plan(records: Vec<Record>, plan: &QueryPlan) -> Result<QueryReport> {
    let span = info_span!("query", records = records.len(), page = plan.page);
    drive(records, plan).instrument(span).await
}

async fn drive(records: Vec<Record>, plan: &QueryPlan) -> Result<QueryReport> {
    let paging = Paging::new(plan.page, plan.page_size).context("invalid paging")?;

    let mut query = QueryState::new(plan.filter.clone()).with_paging(paging);
    query.search = plan.search.clone();
    query.sort = plan.sort.clone();

    let mut model = ListModel::new(query)
        .with_options(plan.options.clone())
        .with_search_fields(plan.search_fields.iter().cloned());
    if let Some(id) = &plan.select {
        model = model.with_init_value(id.clone());
    }

    let source_fields = if plan.search_fields.is_empty() {
        field_names(&records)
    } else {
        plan.search_fields.clone()
    };
    let source =
        JsonSource::new(records, source_fields).with_simulated_failures(plan.simulated_failures);
    let mut controller = ListController::new(model, source);

    controller.load().context("load first page")?;
    let mut completions = controller.settle().await;
    if let Some(last) = plan.through_page {
        for page in plan.page + 1..=last {
            let patch = QueryPatch::new().page(page)?;
            controller
                .set_query(patch)
                .with_context(|| format!("load page {page}"))?;
            completions.extend(controller.settle().await);
        }
    }

    let fetches = controller.fetches_issued();
    info!(fetches, completions = completions.len(), "query settled");
    Ok(QueryReport {
        model: controller.into_model(),
        completions,
        fetches,
    })
}
