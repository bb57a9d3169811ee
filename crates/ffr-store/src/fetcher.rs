//! Fetcher state machine.
//!
//! ```text
//! Idle ──begin──▶ Fetching ──success──▶ Ready
//!                    │  ▲                 │
//!                    │  └──begin (new fp)─┤
//!                    └──────failure────▶ Failed
//! ```
//!
//! Two guarantees are enforced here:
//!
//! - At most one request per distinct fingerprint is in flight. A dispatch
//!   whose fingerprint is already outstanding is coalesced onto it.
//! - A completion is applied only while its fingerprint is still the current
//!   one. Anything else is a stale completion and is dropped.
//!
//! `no_cache` lifts the first guarantee (and the cache hit on `Ready`) on
//! purpose: every dispatch then issues its own request.

use std::collections::BTreeMap;

use ffr_model::{FetchError, FetchOptions, FetchStatus, FetcherState, Fingerprint};
use tracing::{debug, trace, warn};

/// Decision taken for a dispatched query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Begin {
    /// A new request has to be issued.
    Started,
    /// A request for this fingerprint is already outstanding.
    Coalesced,
    /// The current state already holds this fingerprint's data.
    Cached,
}

/// Whether a completion still belongs to the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Current,
    Stale,
}

/// Decision taken for a failed completion of the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Attempt budget left: issue the request again.
    Retry,
    /// The failure was recorded.
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
struct Outstanding {
    requests: u32,
    /// Highest attempt issued for the fingerprint.
    attempt: u32,
}

/// Outstanding requests, counted per fingerprint.
#[derive(Debug, Clone, Default)]
pub struct FetcherMachine {
    in_flight: BTreeMap<Fingerprint, Outstanding>,
}

impl FetcherMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, fingerprint: Fingerprint) -> bool {
        self.in_flight.contains_key(&fingerprint)
    }

    /// Number of outstanding requests across all fingerprints.
    pub fn in_flight(&self) -> u32 {
        self.in_flight.values().map(|o| o.requests).sum()
    }

    /// Decide how to handle a dispatch of `fingerprint`, updating `state`.
    ///
    /// `force` is an explicit refetch: it skips the cache hit but is still
    /// coalesced onto an outstanding request unless `no_cache` is set.
    /// Coalescing resumes the attempt count of the outstanding request.
    pub fn begin<T>(
        &mut self,
        state: &mut FetcherState<T>,
        fingerprint: Fingerprint,
        options: &FetchOptions,
        retain_data: bool,
        force: bool,
    ) -> Begin {
        if !options.no_cache {
            if let Some(outstanding) = self.in_flight.get(&fingerprint) {
                if !(state.is_current(fingerprint) && state.loading()) {
                    state.begin(fingerprint, retain_data);
                    state.attempts = outstanding.attempt;
                }
                trace!(%fingerprint, "coalesced onto in-flight fetch");
                return Begin::Coalesced;
            }
            if !force && state.is_current(fingerprint) && state.status == FetchStatus::Ready {
                trace!(%fingerprint, "query already fetched");
                return Begin::Cached;
            }
        }

        state.begin(fingerprint, retain_data);
        self.issue(fingerprint, state.attempts);
        debug!(%fingerprint, no_cache = options.no_cache, "fetch started");
        Begin::Started
    }

    /// Account for a completion of `fingerprint` and classify it.
    pub fn settle<T>(&mut self, state: &FetcherState<T>, fingerprint: Fingerprint) -> Settle {
        if let Some(outstanding) = self.in_flight.get_mut(&fingerprint) {
            outstanding.requests -= 1;
            if outstanding.requests == 0 {
                self.in_flight.remove(&fingerprint);
            }
        }
        if state.is_current(fingerprint) {
            Settle::Current
        } else {
            debug!(%fingerprint, current = ?state.fingerprint, "dropping stale completion");
            Settle::Stale
        }
    }

    /// Handle a failed completion that [`settle`](Self::settle) classified as current.
    pub fn fail<T>(
        &mut self,
        state: &mut FetcherState<T>,
        error: FetchError,
        options: &FetchOptions,
    ) -> Failure {
        let Some(fingerprint) = state.fingerprint else {
            state.fail(error, options.retains_data());
            return Failure::Failed;
        };
        if state.attempts < options.attempt_budget() {
            state.retry();
            self.issue(fingerprint, state.attempts);
            warn!(
                %fingerprint,
                attempt = state.attempts,
                budget = options.attempt_budget(),
                %error,
                "fetch failed, retrying"
            );
            return Failure::Retry;
        }
        warn!(%fingerprint, attempts = state.attempts, %error, "fetch failed");
        state.fail(error, options.retains_data());
        Failure::Failed
    }

    fn issue(&mut self, fingerprint: Fingerprint, attempt: u32) {
        let outstanding = self.in_flight.entry(fingerprint).or_default();
        outstanding.requests += 1;
        outstanding.attempt = outstanding.attempt.max(attempt);
    }
}
