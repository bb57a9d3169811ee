//! Query state: filter, search, paging and sort for one collection fetch.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPaging")]
pub struct Paging {
    page_index: usize,
    page_size: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPaging {
    page_index: usize,
    page_size: usize,
}

impl TryFrom<RawPaging> for Paging {
    type Error = ModelError;

    fn try_from(raw: RawPaging) -> Result<Self> {
        Self::new(raw.page_index, raw.page_size)
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Paging {
    /// Create a page window. `page_index` starts at 1, `page_size` must be positive.
    pub fn new(page_index: usize, page_size: usize) -> Result<Self> {
        if page_index == 0 || page_size == 0 {
            return Err(ModelError::InvalidPaging {
                page_index,
                page_size,
            });
        }
        Ok(Self {
            page_index,
            page_size,
        })
    }

    /// First page with the given size.
    pub fn first(page_size: usize) -> Result<Self> {
        Self::new(1, page_size)
    }

    #[inline]
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Offset of the first record on this page.
    pub fn offset(&self) -> usize {
        (self.page_index - 1).saturating_mul(self.page_size)
    }

    /// Number of pages needed to show `record_count` records (at least 1).
    pub fn page_count(&self, record_count: usize) -> usize {
        record_count.div_ceil(self.page_size).max(1)
    }
}

/// Sort direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort by a named record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Filter, search, paging and sort for a collection fetch.
///
/// Only changed through [`QueryState::apply`]; every other use treats it as
/// an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState<F, S = String> {
    pub filter: F,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<S>,
    pub paging: Paging,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

impl<F: Default, S> Default for QueryState<F, S> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<F, S> QueryState<F, S> {
    /// Query on the first page with the default page size.
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            search: None,
            paging: Paging::default(),
            sort: None,
        }
    }

    #[must_use]
    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: S) -> Self {
        self.search = Some(search);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Merge a partial update. Fields absent from the patch keep their value.
    pub fn apply(&mut self, patch: QueryPatch<F, S>) {
        if let Some(filter) = patch.filter {
            self.filter = filter;
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(page_size) = patch.page_size {
            self.paging.page_size = page_size.get();
        }
        if let Some(page_index) = patch.page_index {
            self.paging.page_index = page_index.get();
        }
        if let Some(sort) = patch.sort {
            self.sort = sort;
        }
    }
}

/// Partial query update carried by a `SetQuery` action.
///
/// `search` and `sort` are doubly optional: `Some(None)` clears the value.
/// Page fields are non-zero by construction, so a merged [`Paging`] always
/// stays valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPatch<F, S = String> {
    pub filter: Option<F>,
    pub search: Option<Option<S>>,
    pub page_index: Option<NonZeroUsize>,
    pub page_size: Option<NonZeroUsize>,
    pub sort: Option<Option<SortSpec>>,
}

impl<F, S> Default for QueryPatch<F, S> {
    fn default() -> Self {
        Self {
            filter: None,
            search: None,
            page_index: None,
            page_size: None,
            sort: None,
        }
    }
}

impl<F, S> QueryPatch<F, S> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: F) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn search(mut self, search: Option<S>) -> Self {
        self.search = Some(search);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn paging(mut self, paging: Paging) -> Self {
        self.page_index = NonZeroUsize::new(paging.page_index);
        self.page_size = NonZeroUsize::new(paging.page_size);
        self
    }

    /// Move to another page, validating that it is 1-based.
    pub fn page(mut self, page_index: usize) -> Result<Self> {
        let index = NonZeroUsize::new(page_index).ok_or(ModelError::InvalidPaging {
            page_index,
            page_size: self.page_size.map_or(DEFAULT_PAGE_SIZE, NonZeroUsize::get),
        })?;
        self.page_index = Some(index);
        Ok(self)
    }

    /// Change the page size, validating that it is positive.
    pub fn page_size(mut self, page_size: usize) -> Result<Self> {
        let size = NonZeroUsize::new(page_size).ok_or(ModelError::InvalidPaging {
            page_index: self.page_index.map_or(1, NonZeroUsize::get),
            page_size,
        })?;
        self.page_size = Some(size);
        Ok(self)
    }

    /// True if the patch only moves within the page window.
    pub fn is_paging_only(&self) -> bool {
        self.filter.is_none() && self.search.is_none() && self.sort.is_none()
    }
}
