//! List model: query, fetcher state and selection of one collection.
//!
//! The model is updated synchronously. Anything asynchronous is described
//! by the returned [`Transition`]: a `Fetch` transition carries the request
//! the caller has to run, and the caller feeds the outcome back as a
//! `FetchSucceeded`/`FetchFailed` action together with the request's
//! fingerprint.
//!
//! # Example
//!
//! ```ignore
//! let mut model: ListModel<Pod, PodFilter> = ListModel::new(QueryState::default());
//! if let Transition::Fetch(request) = model.load()? {
//!     let fp = request.fingerprint;
//!     let result = api.list_pods(request).await;
//!     model.receive(fp, result);
//! }
//! ```

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use ffr_model::{
    FetchError, FetchOptions, FetcherState, FieldAccess, Fingerprint, Identified, ModelError,
    Paging, QueryPatch, QueryState, RecordSet, SortSpec, field_union, fingerprint, page_list,
    search_list, sort_list,
};

use crate::action::{Action, ListActionType, PayloadOf};
use crate::error::{Result, StoreError};
use crate::fetcher::{Begin, FetcherMachine, Failure, Settle};
use crate::reducer::reduce_to_payload;

/// Request handed to the fetch boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest<F, S = String> {
    /// Key of this request; completions must be reported with it.
    pub fingerprint: Fingerprint,
    pub query: QueryState<F, S>,
    /// Page to fetch, `None` when the whole collection is requested.
    pub paging: Option<Paging>,
    /// Extra payload from [`FetchOptions::data`].
    pub data: Option<Value>,
    /// Records already held that this fetch continues from (incremental lists).
    pub origin_len: usize,
    /// 1 for the first request of this fingerprint, higher for retries.
    pub attempt: u32,
}

// Everything that identifies a request. Paging is left out for fetch-all lists.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestKey<'a, F, S> {
    filter: &'a F,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paging: Option<Paging>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<&'a SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

/// Fingerprint of the request a query produces under `options`.
pub fn request_fingerprint<F: Serialize, S: Serialize>(
    query: &QueryState<F, S>,
    options: &FetchOptions,
) -> std::result::Result<Fingerprint, ModelError> {
    fingerprint(&RequestKey {
        filter: &query.filter,
        search: query.search.as_ref(),
        paging: (!options.fetch_all).then_some(query.paging),
        sort: query.sort.as_ref(),
        data: options.data.as_ref(),
    })
}

/// Actions a list model reduces.
#[derive(Debug, Clone, PartialEq)]
pub enum ListAction<T, F, X = (), S = String> {
    SetQuery(QueryPatch<F, S>),
    Refetch,
    FetchSucceeded {
        fingerprint: Fingerprint,
        records: RecordSet<T, X>,
    },
    FetchFailed {
        fingerprint: Fingerprint,
        error: FetchError,
    },
    SetSelection(Option<T>),
    SetSelections(Vec<T>),
}

impl<T, F, X, S> ListAction<T, F, X, S> {
    pub fn kind(&self) -> ListActionType {
        match self {
            Self::SetQuery(_) => ListActionType::SetQuery,
            Self::Refetch => ListActionType::Refetch,
            Self::FetchSucceeded { .. } => ListActionType::FetchSucceeded,
            Self::FetchFailed { .. } => ListActionType::FetchFailed,
            Self::SetSelection(_) => ListActionType::SetSelection,
            Self::SetSelections(_) => ListActionType::SetSelections,
        }
    }

    /// Completion action for the outcome of a fetch.
    pub fn completed(
        fingerprint: Fingerprint,
        result: std::result::Result<RecordSet<T, X>, FetchError>,
    ) -> Self {
        match result {
            Ok(records) => Self::FetchSucceeded {
                fingerprint,
                records,
            },
            Err(error) => Self::FetchFailed { fingerprint, error },
        }
    }
}

impl<T, F, X, S> Action for ListAction<T, F, X, S> {
    fn action_type(&self) -> &'static str {
        self.kind().name()
    }
}

impl<T: Clone, F, X, S> PayloadOf<Option<T>> for ListAction<T, F, X, S> {
    fn payload_of(&self) -> Option<Option<T>> {
        match self {
            Self::SetSelection(record) => Some(record.clone()),
            _ => None,
        }
    }
}

impl<T: Clone, F, X, S> PayloadOf<Vec<T>> for ListAction<T, F, X, S> {
    fn payload_of(&self) -> Option<Vec<T>> {
        match self {
            Self::SetSelections(records) => Some(records.clone()),
            _ => None,
        }
    }
}

/// What an update did, and what the caller has to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<F, S = String> {
    /// Run this request and report its outcome.
    Fetch(FetchRequest<F, S>),
    /// The fingerprint is already being fetched.
    Coalesced(Fingerprint),
    /// The fingerprint's data is already loaded.
    Cached(Fingerprint),
    /// A completion was applied.
    Applied(Fingerprint),
    /// A failure was recorded.
    Failed(Fingerprint),
    /// A completion for a superseded query was dropped.
    Stale(Fingerprint),
    /// Selection changed; nothing to fetch.
    Updated,
}

/// Outcome of feeding a completion back into the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Received<F, S = String> {
    Applied(Fingerprint),
    Failed(Fingerprint),
    Stale(Fingerprint),
    /// The failure is retried with this request.
    Retry(FetchRequest<F, S>),
}

impl<F, S> From<Received<F, S>> for Transition<F, S> {
    fn from(received: Received<F, S>) -> Self {
        match received {
            Received::Applied(fp) => Self::Applied(fp),
            Received::Failed(fp) => Self::Failed(fp),
            Received::Stale(fp) => Self::Stale(fp),
            Received::Retry(request) => Self::Fetch(request),
        }
    }
}

impl<F, S> Transition<F, S> {
    /// The request to run, if any.
    pub fn into_request(self) -> Option<FetchRequest<F, S>> {
        match self {
            Self::Fetch(request) => Some(request),
            _ => None,
        }
    }
}

/// State of one list screen.
///
/// UI code reads `list.data` (records and `record_count`), `list.loading()`,
/// `list.error` and the selections, and changes the model only through
/// [`set_query`](Self::set_query) and the selection setters.
#[derive(Debug, Clone)]
pub struct ListModel<T: Identified, F, X = (), S = String> {
    pub list: FetcherState<RecordSet<T, X>>,
    pub query: QueryState<F, S>,
    pub selection: Option<T>,
    pub selections: Vec<T>,
    /// Identifier selected after the first successful fetch.
    pub init_value: Option<T::Id>,
    /// Identifiers multi-selected after the first successful fetch.
    pub init_values: Vec<T::Id>,
    pub options: FetchOptions,
    /// Fields searched locally for fetch-all lists. Empty means every field.
    pub search_fields: Vec<String>,
    machine: FetcherMachine,
    init_applied: bool,
    /// Last page an incremental list has merged into its records.
    held_through: Option<usize>,
}

impl<T, F, X, S> ListModel<T, F, X, S>
where
    T: Identified + Clone,
    F: Serialize + Clone,
    S: Serialize + Clone,
{
    pub fn new(query: QueryState<F, S>) -> Self {
        Self {
            list: FetcherState::idle(),
            query,
            selection: None,
            selections: Vec::new(),
            init_value: None,
            init_values: Vec::new(),
            options: FetchOptions::default(),
            search_fields: Vec::new(),
            machine: FetcherMachine::new(),
            init_applied: false,
            held_through: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_init_value(mut self, id: T::Id) -> Self {
        self.init_value = Some(id);
        self
    }

    #[must_use]
    pub fn with_init_values(mut self, ids: Vec<T::Id>) -> Self {
        self.init_values = ids;
        self
    }

    #[must_use]
    pub fn with_search_fields<I, N>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Fingerprint of the current query.
    pub fn fingerprint(&self) -> std::result::Result<Fingerprint, ModelError> {
        request_fingerprint(&self.query, &self.options)
    }

    /// Requests currently outstanding for this list.
    pub fn in_flight(&self) -> u32 {
        self.machine.in_flight()
    }

    /// Reduce one action.
    pub fn update(&mut self, action: ListAction<T, F, X, S>) -> Result<Transition<F, S>> {
        trace!(action_type = action.action_type(), "reducing list action");
        match action {
            ListAction::SetQuery(patch) => self.set_query(patch),
            ListAction::Refetch => self.refetch(),
            ListAction::FetchSucceeded {
                fingerprint,
                records,
            } => Ok(self.receive(fingerprint, Ok(records)).into()),
            ListAction::FetchFailed { fingerprint, error } => {
                Ok(self.receive(fingerprint, Err(error)).into())
            }
            selection @ (ListAction::SetSelection(_) | ListAction::SetSelections(_)) => {
                self.reduce_selection(&selection);
                Ok(Transition::Updated)
            }
        }
    }

    /// Fetch the current query unless it is already loaded or loading.
    pub fn load(&mut self) -> Result<Transition<F, S>> {
        let fingerprint = self
            .fingerprint()
            .map_err(|e| StoreError::rejected(ListActionType::Refetch.name(), e))?;
        let retain = self.options.retains_data();
        Ok(self.begin(fingerprint, retain, false))
    }

    /// Merge `patch` into the query and fetch if that changes the request.
    ///
    /// If the merged query cannot be fingerprinted the model is left as it was.
    pub fn set_query(&mut self, patch: QueryPatch<F, S>) -> Result<Transition<F, S>> {
        let paging_only = patch.is_paging_only();
        let mut next = self.query.clone();
        next.apply(patch);
        let fingerprint = request_fingerprint(&next, &self.options)
            .map_err(|e| StoreError::rejected(ListActionType::SetQuery.name(), e))?;
        self.query = next;

        // Incremental lists keep their records across paging. Whether the
        // page is appended is decided by `appends`.
        let retain = if self.options.incremental {
            paging_only
        } else {
            self.options.retains_data()
        };
        Ok(self.begin(fingerprint, retain, false))
    }

    /// Fetch the current query again, even if it is loaded.
    pub fn refetch(&mut self) -> Result<Transition<F, S>> {
        let fingerprint = self
            .fingerprint()
            .map_err(|e| StoreError::rejected(ListActionType::Refetch.name(), e))?;
        let retain = self.options.retains_data() || self.options.incremental;
        Ok(self.begin(fingerprint, retain, true))
    }

    /// Apply the outcome of the request identified by `fingerprint`.
    pub fn receive(
        &mut self,
        fingerprint: Fingerprint,
        result: std::result::Result<RecordSet<T, X>, FetchError>,
    ) -> Received<F, S> {
        if self.machine.settle(&self.list, fingerprint) == Settle::Stale {
            return Received::Stale(fingerprint);
        }
        match result {
            Ok(records) => {
                self.apply_records(records);
                debug!(
                    %fingerprint,
                    records = self.records().len(),
                    record_count = self.record_count(),
                    "fetch applied"
                );
                Received::Applied(fingerprint)
            }
            Err(error) => match self.machine.fail(&mut self.list, error, &self.options) {
                Failure::Retry => Received::Retry(self.request(fingerprint)),
                Failure::Failed => Received::Failed(fingerprint),
            },
        }
    }

    /// Replace the single selection. The record is not checked against the data.
    pub fn set_selection(&mut self, record: Option<T>) {
        self.reduce_selection(&ListAction::SetSelection(record));
    }

    /// Replace the multi selection. The records are not checked against the data.
    pub fn set_selections(&mut self, records: Vec<T>) {
        self.reduce_selection(&ListAction::SetSelections(records));
    }

    /// Records of the last successful fetch.
    pub fn records(&self) -> &[T] {
        self.list
            .data
            .as_ref()
            .map_or(&[], |set| set.records.as_slice())
    }

    /// Total reported for the last successful fetch.
    pub fn record_count(&self) -> usize {
        self.list.data.as_ref().map_or(0, |set| set.record_count)
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.list.error.as_ref()
    }

    fn begin(&mut self, fingerprint: Fingerprint, retain: bool, force: bool) -> Transition<F, S> {
        match self
            .machine
            .begin(&mut self.list, fingerprint, &self.options, retain, force)
        {
            Begin::Started => Transition::Fetch(self.request(fingerprint)),
            Begin::Coalesced => Transition::Coalesced(fingerprint),
            Begin::Cached => Transition::Cached(fingerprint),
        }
    }

    fn request(&self, fingerprint: Fingerprint) -> FetchRequest<F, S> {
        FetchRequest {
            fingerprint,
            query: self.query.clone(),
            paging: (!self.options.fetch_all).then_some(self.query.paging),
            data: self.options.data.clone(),
            origin_len: if self.appends() {
                self.records().len()
            } else {
                0
            },
            attempt: self.list.attempts,
        }
    }

    // An incremental list extends its records only with a page past the
    // last one it merged. Refetches and backward paging replace them.
    fn appends(&self) -> bool {
        self.options.incremental
            && !self.options.fetch_all
            && self.list.data.is_some()
            && self
                .held_through
                .is_some_and(|held| self.query.paging.page_index() > held)
    }

    fn apply_records(&mut self, records: RecordSet<T, X>) {
        let append = self.appends();
        let merged = match self.list.data.take() {
            Some(mut previous) if append => {
                previous.extend_with(records);
                previous
            }
            _ => records,
        };
        if self.options.incremental {
            self.held_through = Some(self.query.paging.page_index());
        }
        self.list.succeed(merged);
        self.apply_init_selection();
    }

    // Only the first successful fetch may derive a default selection.
    fn apply_init_selection(&mut self) {
        if self.init_applied {
            return;
        }
        self.init_applied = true;
        let Some(set) = &self.list.data else {
            return;
        };
        if self.selection.is_none()
            && let Some(id) = &self.init_value
        {
            self.selection = set.find(id).cloned();
        }
        if self.selections.is_empty() && !self.init_values.is_empty() {
            self.selections = self
                .init_values
                .iter()
                .filter_map(|id| set.find(id))
                .cloned()
                .collect();
        }
    }

    fn reduce_selection(&mut self, action: &ListAction<T, F, X, S>) {
        self.selection = reduce_to_payload(ListActionType::SetSelection, None)
            .reduce(self.selection.take(), action);
        self.selections = reduce_to_payload(ListActionType::SetSelections, Vec::new())
            .reduce(std::mem::take(&mut self.selections), action);
    }
}

impl<T, F, X, S> ListModel<T, F, X, S>
where
    T: Identified + FieldAccess + Clone,
    F: Serialize + Clone,
    S: Serialize + Clone + AsRef<str>,
{
    /// Records to show for the current page.
    ///
    /// Server-paged lists show what was fetched. Fetch-all lists search,
    /// sort and page the full collection locally.
    pub fn visible_records(&self) -> Cow<'_, [T]> {
        let records = self.records();
        if !self.options.fetch_all {
            return Cow::Borrowed(records);
        }
        let filtered = self.locally_filtered(records);
        let page = page_list(&filtered, &self.query.paging);
        Cow::Owned(page.to_vec())
    }

    /// Number of records the pager should count.
    pub fn visible_count(&self) -> usize {
        if !self.options.fetch_all {
            return self.record_count();
        }
        self.locally_filtered(self.records()).len()
    }

    fn locally_filtered<'a>(&self, records: &'a [T]) -> Cow<'a, [T]> {
        let term = self.query.search.as_ref().map(<S as AsRef<str>>::as_ref);
        let searched = if self.search_fields.is_empty() {
            search_list(records, term, &field_union(records))
        } else {
            search_list(records, term, &self.search_fields)
        };
        match &self.query.sort {
            Some(sort) => Cow::Owned(sort_list(&searched, sort)),
            None => searched,
        }
    }
}
