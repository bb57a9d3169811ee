//! List controller scenarios with a fetcher whose completions the test releases.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use ffr_model::{FetchError, FetchOptions, QueryPatch, QueryState, RecordSet};
use ffr_store::{
    Completion, Dispatched, Fetch, FetchRequest, ListAction, ListController, ListModel,
    StoreError,
};
use serde_json::{Value, json};
use tokio::sync::oneshot;

type Reply = oneshot::Sender<Result<RecordSet<Value>, FetchError>>;

/// Records every request and leaves it pending until the test replies.
#[derive(Clone, Default)]
struct Scripted {
    calls: Rc<RefCell<Vec<(FetchRequest<Value>, Option<Reply>)>>>,
}

impl Scripted {
    fn calls(&self) -> usize {
        self.calls.borrow().len()
    }

    fn request(&self, index: usize) -> FetchRequest<Value> {
        self.calls.borrow()[index].0.clone()
    }

    fn reply(&self, index: usize, result: Result<RecordSet<Value>, FetchError>) {
        let sender = self.calls.borrow_mut()[index]
            .1
            .take()
            .expect("request already answered");
        sender.send(result).expect("controller dropped the request");
    }
}

impl Fetch<Value, Value> for Scripted {
    fn fetch(
        &self,
        request: FetchRequest<Value>,
    ) -> impl Future<Output = Result<RecordSet<Value>, FetchError>> + 'static {
        let (tx, rx) = oneshot::channel();
        self.calls.borrow_mut().push((request, Some(tx)));
        async move {
            rx.await
                .unwrap_or_else(|_| Err(FetchError::transport("request dropped")))
        }
    }
}

fn pods(ids: std::ops::RangeInclusive<u32>, total: usize) -> RecordSet<Value> {
    RecordSet::page(
        ids.map(|id| json!({"id": id, "name": format!("pod-{id}")}))
            .collect(),
        total,
    )
}

fn controller(options: FetchOptions) -> (ListController<Value, Value, (), String, Scripted>, Scripted) {
    let scripted = Scripted::default();
    let model = ListModel::new(QueryState::new(json!({"ns": "default"}))).with_options(options);
    (ListController::new(model, scripted.clone()), scripted)
}

fn page(index: usize) -> QueryPatch<Value> {
    QueryPatch::new().page(index).unwrap()
}

fn ids(controller: &ListController<Value, Value, (), String, Scripted>) -> Vec<Value> {
    controller
        .model()
        .records()
        .iter()
        .map(|r| r["id"].clone())
        .collect()
}

#[tokio::test]
async fn duplicate_dispatch_issues_one_fetch() {
    let (mut controller, scripted) = controller(FetchOptions::default());

    let first = controller.load().unwrap();
    let second = controller.set_query(page(1)).unwrap();
    let Dispatched::Issued(fp) = first else {
        panic!("expected a fetch, got {first:?}");
    };
    assert_eq!(second, Dispatched::Coalesced(fp));
    assert_eq!(scripted.calls(), 1);

    scripted.reply(0, Ok(pods(1..=3, 3)));
    assert_eq!(controller.settle().await, vec![Completion::Applied(fp)]);
    assert_eq!(ids(&controller), vec![json!(1), json!(2), json!(3)]);
    assert_eq!(controller.fetches_issued(), 1);
}

#[tokio::test]
async fn late_completion_of_superseded_query_is_dropped() {
    let (mut controller, scripted) = controller(FetchOptions::default());

    let Dispatched::Issued(q1) = controller.set_query(page(2)).unwrap() else {
        panic!("q1 not issued");
    };
    let Dispatched::Issued(q2) = controller.set_query(page(3)).unwrap() else {
        panic!("q2 not issued");
    };
    assert_eq!(controller.in_flight(), 2);

    scripted.reply(1, Ok(pods(41..=60, 100)));
    assert_eq!(controller.next_completion().await, Some(Completion::Applied(q2)));

    scripted.reply(0, Ok(pods(21..=40, 100)));
    assert_eq!(controller.next_completion().await, Some(Completion::Stale(q1)));

    let model = controller.model();
    assert_eq!(model.query.paging.page_index(), 3);
    assert_eq!(model.records()[0]["id"], 41);
    assert!(model.list.valid());
}

#[tokio::test]
async fn returning_to_pending_query_reuses_its_fetch() {
    let (mut controller, scripted) = controller(FetchOptions::default());

    let Dispatched::Issued(q1) = controller.load().unwrap() else {
        panic!("q1 not issued");
    };
    controller.set_query(page(2)).unwrap();
    assert_eq!(controller.set_query(page(1)).unwrap(), Dispatched::Coalesced(q1));
    assert_eq!(scripted.calls(), 2);

    scripted.reply(1, Ok(pods(21..=40, 100)));
    scripted.reply(0, Ok(pods(1..=20, 100)));
    let completions = controller.settle().await;

    assert_eq!(completions.len(), 2);
    assert!(completions.contains(&Completion::Applied(q1)));
    assert_eq!(controller.model().records()[0]["id"], 1);
}

#[tokio::test]
async fn failures_are_retried_within_budget() {
    let (mut controller, scripted) =
        controller(FetchOptions::default().with_max_fetch_times(3));
    let Dispatched::Issued(fp) = controller.load().unwrap() else {
        panic!("not issued");
    };

    scripted.reply(0, Err(FetchError::transport("connection reset")));
    assert_eq!(controller.next_completion().await, Some(Completion::Retrying(fp)));
    assert_eq!(scripted.calls(), 2);
    assert_eq!(scripted.request(1).attempt, 2);
    assert!(controller.model().list.loading());

    scripted.reply(1, Ok(pods(1..=2, 2)));
    assert_eq!(controller.next_completion().await, Some(Completion::Applied(fp)));
    assert!(controller.model().error().is_none());
}

#[tokio::test]
async fn failure_keeps_last_good_records() {
    let (mut controller, scripted) = controller(FetchOptions::default());
    controller.load().unwrap();
    scripted.reply(0, Ok(pods(1..=20, 40)));
    controller.settle().await;

    let Dispatched::Issued(fp) = controller.set_query(page(2)).unwrap() else {
        panic!("page 2 not issued");
    };
    scripted.reply(1, Err(FetchError::server(502, "bad gateway")));
    assert_eq!(controller.settle().await, vec![Completion::Failed(fp)]);

    let model = controller.model();
    assert_eq!(model.error(), Some(&FetchError::server(502, "bad gateway")));
    assert!(!model.list.valid());
    assert_eq!(model.records().len(), 20);

    // The failed query can be dispatched again.
    assert_eq!(controller.refetch().unwrap(), Dispatched::Issued(fp));
    assert_eq!(scripted.calls(), 3);
}

#[tokio::test]
async fn no_cache_issues_every_dispatch() {
    let (mut controller, scripted) = controller(FetchOptions::default().with_no_cache(true));

    assert!(matches!(controller.load().unwrap(), Dispatched::Issued(_)));
    assert!(matches!(controller.load().unwrap(), Dispatched::Issued(_)));
    assert_eq!(scripted.calls(), 2);

    scripted.reply(0, Err(FetchError::decode("unexpected token")));
    scripted.reply(1, Err(FetchError::decode("unexpected token")));
    controller.settle().await;
    assert!(controller.model().list.data.is_none());
}

#[tokio::test]
async fn fetch_all_pages_without_refetching() {
    let (mut controller, scripted) = controller(FetchOptions::default().with_fetch_all(true));
    let Dispatched::Issued(fp) = controller.load().unwrap() else {
        panic!("not issued");
    };
    assert_eq!(scripted.request(0).paging, None);

    scripted.reply(0, Ok(pods(1..=45, 45)));
    controller.settle().await;

    assert_eq!(controller.set_query(page(3)).unwrap(), Dispatched::Cached(fp));
    assert_eq!(scripted.calls(), 1);
    let visible = controller.model().visible_records();
    assert_eq!(visible.len(), 5);
    assert_eq!(visible[0]["id"], 41);
}

#[tokio::test]
async fn init_value_selects_from_first_fetch() {
    let scripted = Scripted::default();
    let model: ListModel<Value, Value> = ListModel::new(QueryState::new(json!({})))
        .with_init_value(json!(2))
        .with_init_values(vec![json!(3), json!(1)]);
    let mut controller = ListController::new(model, scripted.clone());

    controller.load().unwrap();
    scripted.reply(0, Ok(pods(1..=3, 3)));
    controller.settle().await;

    let model = controller.model();
    assert_eq!(model.selection.as_ref().map(|r| r["id"].clone()), Some(json!(2)));
    let selected: Vec<_> = model.selections.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(selected, vec![json!(3), json!(1)]);
}

#[tokio::test]
async fn hand_dispatched_completion_is_guarded() {
    let (mut controller, scripted) = controller(FetchOptions::default());
    let Dispatched::Issued(fp) = controller.load().unwrap() else {
        panic!("not issued");
    };
    let other = ffr_model::fingerprint_str("someone else");

    let dispatched = controller
        .dispatch(ListAction::completed(other, Ok(pods(9..=9, 1))))
        .unwrap();
    assert_eq!(dispatched, Dispatched::Settled(Completion::Stale(other)));
    assert!(controller.model().list.loading());

    scripted.reply(0, Ok(pods(1..=1, 1)));
    assert_eq!(controller.settle().await, vec![Completion::Applied(fp)]);
}

#[test]
fn unfingerprintable_filter_is_rejected() {
    let fetcher = |_request: FetchRequest<HashMap<(u8, u8), u8>>| async {
        Ok::<RecordSet<Value>, FetchError>(RecordSet::default())
    };
    let model: ListModel<Value, HashMap<(u8, u8), u8>> =
        ListModel::new(QueryState::new(HashMap::new()));
    let mut controller = ListController::new(model, fetcher);

    let mut filter = HashMap::new();
    filter.insert((0, 1), 2);
    let err = controller
        .set_query(QueryPatch::new().filter(filter))
        .unwrap_err();

    assert!(matches!(err, StoreError::Rejected { .. }));
    assert!(!err.user_message().is_empty());
    assert_eq!(controller.in_flight(), 0);
    assert!(controller.model().query.filter.is_empty());
}

#[tokio::test]
async fn incremental_refetch_does_not_repeat_last_page() {
    let (mut controller, scripted) = controller(FetchOptions::default().with_incremental(true));
    controller.load().unwrap();
    scripted.reply(0, Ok(pods(1..=2, 6)));
    controller.settle().await;
    controller.set_query(page(2)).unwrap();
    scripted.reply(1, Ok(pods(3..=4, 6)));
    controller.settle().await;
    assert_eq!(ids(&controller).len(), 4);

    let Dispatched::Issued(fp) = controller.refetch().unwrap() else {
        panic!("refetch not issued");
    };
    assert_eq!(scripted.request(2).origin_len, 0);
    scripted.reply(2, Ok(pods(3..=4, 6)));
    assert_eq!(controller.settle().await, vec![Completion::Applied(fp)]);
    assert_eq!(ids(&controller), vec![json!(3), json!(4)]);
}

#[tokio::test]
async fn incremental_paging_back_starts_over() {
    let (mut controller, scripted) = controller(FetchOptions::default().with_incremental(true));
    controller.load().unwrap();
    scripted.reply(0, Ok(pods(1..=2, 6)));
    controller.settle().await;
    controller.set_query(page(2)).unwrap();
    scripted.reply(1, Ok(pods(3..=4, 6)));
    controller.settle().await;

    assert!(matches!(
        controller.set_query(page(1)).unwrap(),
        Dispatched::Issued(_)
    ));
    scripted.reply(2, Ok(pods(1..=2, 6)));
    controller.settle().await;
    assert_eq!(ids(&controller), vec![json!(1), json!(2)]);
    assert_eq!(controller.model().list.data.as_ref().unwrap().len(), 2);
}

#[tokio::test]
async fn returning_to_a_retrying_query_keeps_its_budget() {
    let (mut controller, scripted) = controller(FetchOptions::default().with_max_fetch_times(2));
    let Dispatched::Issued(q1) = controller.load().unwrap() else {
        panic!("q1 not issued");
    };
    scripted.reply(0, Err(FetchError::transport("connection reset")));
    assert_eq!(controller.next_completion().await, Some(Completion::Retrying(q1)));
    assert_eq!(scripted.request(1).attempt, 2);

    let Dispatched::Issued(q2) = controller.set_query(page(2)).unwrap() else {
        panic!("q2 not issued");
    };
    assert_eq!(controller.set_query(page(1)).unwrap(), Dispatched::Coalesced(q1));

    scripted.reply(1, Err(FetchError::transport("connection reset")));
    assert_eq!(controller.next_completion().await, Some(Completion::Failed(q1)));
    assert_eq!(scripted.calls(), 3);

    scripted.reply(2, Ok(pods(21..=40, 100)));
    assert_eq!(controller.settle().await, vec![Completion::Stale(q2)]);
    assert!(controller.model().error().is_some());
}

#[tokio::test]
async fn fetch_all_search_covers_every_field_by_default() {
    let (mut controller, scripted) = controller(FetchOptions::default().with_fetch_all(true));
    controller.load().unwrap();
    let mut all = pods(1..=3, 3);
    all.records.push(json!({"id": 4, "owner": "pod-team"}));
    scripted.reply(0, Ok(all.clone()));
    controller.settle().await;

    controller
        .set_query(QueryPatch::new().search(Some("pod-".to_string())))
        .unwrap();
    scripted.reply(1, Ok(all));
    controller.settle().await;

    assert_eq!(controller.model().visible_count(), 4);
    controller
        .set_query(QueryPatch::new().search(Some("team".to_string())))
        .unwrap();
    let visible = controller.model().visible_records();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["id"], 4);
}
