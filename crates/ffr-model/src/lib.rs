//! Data model for ff-redux list state.
//!
//! This crate holds the plain data a list screen keeps in application state
//! and the pure helpers that operate on it:
//!
//! - `fingerprint` - structural digests used as request/cache keys
//! - `collection` - lookup, filter, search, sort and paging over record slices
//! - `query` - filter, search, paging and sort of a fetch, plus partial updates
//! - `record_set` - a page of records plus the server-reported total
//! - `fetcher` - lifecycle record of one asynchronous fetch
//! - `options` - per-list fetch options
//! - `error` - error types with user-friendly messages

pub mod collection;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod options;
pub mod query;
pub mod record_set;

pub use collection::{
    FieldAccess, Identified, collection_where, field_union, find_by_condition, find_by_id,
    json_text, other_member, page_list, search_list, sort_list,
};
pub use error::{FetchError, ModelError, Result};
pub use fetcher::{FetchStatus, FetcherState};
pub use fingerprint::{FINGERPRINT_SEED, Fingerprint, canonical_string, fingerprint, fingerprint_str};
pub use options::FetchOptions;
pub use query::{DEFAULT_PAGE_SIZE, Paging, QueryPatch, QueryState, SortDirection, SortSpec};
pub use record_set::RecordSet;
