//! Drives a [`ListModel`] against a [`Fetch`] implementation.
//!
//! The controller is the single writer of its model. Actions are applied as
//! they are dispatched; fetches it starts run concurrently on a local
//! `FuturesUnordered` and are applied one at a time, in completion order,
//! through [`ListController::next_completion`].

use futures_util::future::LocalBoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use tracing::{debug, trace};

use ffr_model::{FetchError, Fingerprint, Identified, QueryPatch, RecordSet};

use crate::error::Result;
use crate::fetch::Fetch;
use crate::list_model::{FetchRequest, ListAction, ListModel, Received, Transition};

type Pending<T, X> =
    LocalBoxFuture<'static, (Fingerprint, std::result::Result<RecordSet<T, X>, FetchError>)>;

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A fetch was started.
    Issued(Fingerprint),
    /// Joined a fetch already running for the fingerprint.
    Coalesced(Fingerprint),
    /// The fingerprint's data was already loaded.
    Cached(Fingerprint),
    /// A completion action was dispatched by hand.
    Settled(Completion),
    /// Only selection changed.
    Updated,
}

/// How a completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied(Fingerprint),
    Failed(Fingerprint),
    /// The query moved on before this completion arrived.
    Stale(Fingerprint),
    /// The fetch failed and was issued again.
    Retrying(Fingerprint),
}

impl Completion {
    pub fn fingerprint(&self) -> Fingerprint {
        match *self {
            Self::Applied(fp) | Self::Failed(fp) | Self::Stale(fp) | Self::Retrying(fp) => fp,
        }
    }
}

/// A list model together with its data source.
pub struct ListController<T: Identified, F, X, S, H> {
    model: ListModel<T, F, X, S>,
    fetcher: H,
    pending: FuturesUnordered<Pending<T, X>>,
    issued: u64,
}

impl<T, F, X, S, H> ListController<T, F, X, S, H>
where
    T: Identified + Clone + 'static,
    F: Serialize + Clone,
    S: Serialize + Clone,
    X: 'static,
    H: Fetch<T, F, X, S>,
{
    pub fn new(model: ListModel<T, F, X, S>, fetcher: H) -> Self {
        Self {
            model,
            fetcher,
            pending: FuturesUnordered::new(),
            issued: 0,
        }
    }

    pub fn model(&self) -> &ListModel<T, F, X, S> {
        &self.model
    }

    pub fn into_model(self) -> ListModel<T, F, X, S> {
        self.model
    }

    /// Fetches not yet completed.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Fetches started since the controller was created, retries included.
    pub fn fetches_issued(&self) -> u64 {
        self.issued
    }

    /// Apply an action and start the fetch it calls for, if any.
    pub fn dispatch(&mut self, action: ListAction<T, F, X, S>) -> Result<Dispatched> {
        let transition = self.model.update(action)?;
        Ok(self.run(transition))
    }

    /// Fetch the current query if it is neither loaded nor loading.
    pub fn load(&mut self) -> Result<Dispatched> {
        let transition = self.model.load()?;
        Ok(self.run(transition))
    }

    pub fn set_query(&mut self, patch: QueryPatch<F, S>) -> Result<Dispatched> {
        self.dispatch(ListAction::SetQuery(patch))
    }

    pub fn refetch(&mut self) -> Result<Dispatched> {
        self.dispatch(ListAction::Refetch)
    }

    pub fn set_selection(&mut self, record: Option<T>) {
        self.model.set_selection(record);
    }

    pub fn set_selections(&mut self, records: Vec<T>) {
        self.model.set_selections(records);
    }

    /// Wait for the next fetch to finish and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let (fingerprint, result) = self.pending.next().await?;
        let completion = match self.model.receive(fingerprint, result) {
            Received::Applied(fp) => Completion::Applied(fp),
            Received::Failed(fp) => Completion::Failed(fp),
            Received::Stale(fp) => Completion::Stale(fp),
            Received::Retry(request) => {
                self.spawn(request);
                Completion::Retrying(fingerprint)
            }
        };
        trace!(?completion, in_flight = self.pending.len(), "completion handled");
        Some(completion)
    }

    /// Apply completions until nothing is in flight.
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(completion) = self.next_completion().await {
            completions.push(completion);
        }
        completions
    }

    fn run(&mut self, transition: Transition<F, S>) -> Dispatched {
        match transition {
            Transition::Fetch(request) => {
                let fingerprint = request.fingerprint;
                self.spawn(request);
                Dispatched::Issued(fingerprint)
            }
            Transition::Coalesced(fp) => Dispatched::Coalesced(fp),
            Transition::Cached(fp) => Dispatched::Cached(fp),
            Transition::Applied(fp) => Dispatched::Settled(Completion::Applied(fp)),
            Transition::Failed(fp) => Dispatched::Settled(Completion::Failed(fp)),
            Transition::Stale(fp) => Dispatched::Settled(Completion::Stale(fp)),
            Transition::Updated => Dispatched::Updated,
        }
    }

    fn spawn(&mut self, request: FetchRequest<F, S>) {
        let fingerprint = request.fingerprint;
        debug!(%fingerprint, attempt = request.attempt, "spawning fetch");
        let fetch = self.fetcher.fetch(request);
        self.pending
            .push(async move { (fingerprint, fetch.await) }.boxed_local());
        self.issued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffr_model::QueryState;
    use serde_json::{Value, json};
    use std::cell::Cell;
    use std::rc::Rc;

    fn rows(n: u32) -> RecordSet<Value> {
        RecordSet::from_records((0..n).map(|id| json!({"id": id})).collect())
    }

    #[tokio::test]
    async fn test_load_then_settle() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let fetcher = move |_request: FetchRequest<Value>| {
            counter.set(counter.get() + 1);
            async { Ok::<_, FetchError>(rows(3)) }
        };
        let model: ListModel<Value, Value> = ListModel::new(QueryState::new(json!({})));
        let mut controller = ListController::new(model, fetcher);

        let dispatched = controller.load().unwrap();
        assert!(matches!(dispatched, Dispatched::Issued(_)));
        assert_eq!(controller.in_flight(), 1);

        let completions = controller.settle().await;
        assert_eq!(completions.len(), 1);
        assert!(matches!(completions[0], Completion::Applied(_)));
        assert_eq!(controller.model().records().len(), 3);
        assert_eq!(calls.get(), 1);
        assert!(controller.next_completion().await.is_none());
    }

    #[tokio::test]
    async fn test_selection_does_not_fetch() {
        let fetcher = |_request: FetchRequest<Value>| async { Ok::<_, FetchError>(rows(1)) };
        let model: ListModel<Value, Value> = ListModel::new(QueryState::new(json!({})));
        let mut controller = ListController::new(model, fetcher);

        let dispatched = controller
            .dispatch(ListAction::SetSelection(Some(json!({"id": 1}))))
            .unwrap();
        assert_eq!(dispatched, Dispatched::Updated);
        assert_eq!(controller.fetches_issued(), 0);
    }
}
