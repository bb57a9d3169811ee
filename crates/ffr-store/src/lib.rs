//! Redux-style state management for fetched lists.
//!
//! - `action` - action type table and the dispatch traits
//! - `reducer` - pure reducers and their composition
//! - `fetcher` - fetcher state machine (coalescing, cache hits, staleness, retries)
//! - `list_model` - query, fetcher state and selection of one list
//! - `fetch` - the data source boundary
//! - `controller` - runs a list model against a data source
//!
//! `ListModel::update` is synchronous and pure apart from the requests it
//! hands back. `ListController` owns the async side.

pub mod action;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod fetcher;
pub mod list_model;
pub mod reducer;

pub use action::{Action, ListActionType, PayloadAction, PayloadOf};
pub use controller::{Completion, Dispatched, ListController};
pub use error::{Result, StoreError};
pub use fetch::Fetch;
pub use fetcher::{Begin, Failure, FetcherMachine, Settle};
pub use list_model::{
    FetchRequest, ListAction, ListModel, Received, Transition, request_fingerprint,
};
pub use reducer::{
    BoxReducer, PayloadReducer, Reducer, SerialReducer, payload_stage, reduce_to_payload,
    serial_reducer,
};
