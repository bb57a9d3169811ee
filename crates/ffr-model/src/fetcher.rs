//! Lifecycle record of one asynchronous fetch.
//!
//! `FetcherState` is plain data plus the primitive transitions. Deciding
//! *whether* a transition applies (coalescing, cache hits, staleness) is the
//! job of the fetcher state machine in `ffr-store`.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::fingerprint::Fingerprint;

/// Lifecycle phase of a fetch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request for the current fingerprint is outstanding.
    Fetching,
    /// The current fingerprint's data arrived.
    Ready,
    /// The current fingerprint's fetch failed.
    Failed,
}

impl FetchStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Fetch lifecycle for the data of one list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetcherState<T> {
    /// Fingerprint of the query this state belongs to.
    pub fingerprint: Option<Fingerprint>,
    pub status: FetchStatus,
    /// At least one fetch has completed successfully.
    pub fetched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FetchError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Requests issued for the current fingerprint, retries included.
    pub attempts: u32,
}

impl<T> Default for FetcherState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> FetcherState<T> {
    pub fn idle() -> Self {
        Self {
            fingerprint: None,
            status: FetchStatus::Idle,
            fetched: false,
            error: None,
            data: None,
            attempts: 0,
        }
    }

    #[inline]
    pub fn loading(&self) -> bool {
        self.status == FetchStatus::Fetching
    }

    /// The data belongs to the current fingerprint.
    #[inline]
    pub fn valid(&self) -> bool {
        self.status == FetchStatus::Ready
    }

    #[inline]
    pub fn is_current(&self, fingerprint: Fingerprint) -> bool {
        self.fingerprint == Some(fingerprint)
    }

    /// Start a new cycle for `fingerprint`, replacing this state.
    ///
    /// With `retain_data` the previous data stays visible while loading.
    pub fn begin(&mut self, fingerprint: Fingerprint, retain_data: bool) {
        let data = if retain_data { self.data.take() } else { None };
        *self = Self {
            fingerprint: Some(fingerprint),
            status: FetchStatus::Fetching,
            fetched: self.fetched,
            error: None,
            data,
            attempts: 1,
        };
    }

    /// Count a retry of the current request.
    pub fn retry(&mut self) {
        self.attempts += 1;
    }

    pub fn succeed(&mut self, data: T) {
        self.status = FetchStatus::Ready;
        self.fetched = true;
        self.error = None;
        self.data = Some(data);
    }

    /// Record a failure. Without `retain_data` the previous data is dropped.
    pub fn fail(&mut self, error: FetchError, retain_data: bool) {
        self.status = FetchStatus::Failed;
        self.error = Some(error);
        if !retain_data {
            self.data = None;
        }
    }
}
