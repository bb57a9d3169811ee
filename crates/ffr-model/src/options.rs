//! Per-list fetch options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// Options recognized by a list's fetch cycle.
///
/// Keys are camelCase when read from TOML or JSON.
///
/// ```toml
/// noCache = false
/// fetchAll = true
/// maxFetchTimes = 3
///
/// [data]
/// cluster = "eu-1"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchOptions {
    /// Always issue a new request, even for a query that is cached or in
    /// flight. Also disables showing the previous data while loading or
    /// after a failure.
    pub no_cache: bool,

    /// Fetch the whole collection once and page/search locally.
    pub fetch_all: bool,

    /// Opaque extra payload handed to the transport with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Total attempts per fingerprint before a failure is recorded.
    pub max_fetch_times: u32,

    /// Append each successful fetch to the previous records instead of
    /// replacing them (load-more lists).
    #[serde(alias = "orginData")]
    pub incremental: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            no_cache: false,
            fetch_all: false,
            data: None,
            max_fetch_times: 1,
            incremental: false,
        }
    }
}

impl FetchOptions {
    /// Parse options from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|source| ModelError::Config { source })
    }

    #[must_use]
    pub fn with_no_cache(mut self, enable: bool) -> Self {
        self.no_cache = enable;
        self
    }

    #[must_use]
    pub fn with_fetch_all(mut self, enable: bool) -> Self {
        self.fetch_all = enable;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_max_fetch_times(mut self, times: u32) -> Self {
        self.max_fetch_times = times;
        self
    }

    #[must_use]
    pub fn with_incremental(mut self, enable: bool) -> Self {
        self.incremental = enable;
        self
    }

    /// Attempt budget, never below one.
    pub fn attempt_budget(&self) -> u32 {
        self.max_fetch_times.max(1)
    }

    /// Previous data stays visible while a new fetch runs or after it fails.
    pub fn retains_data(&self) -> bool {
        !self.no_cache
    }
}
