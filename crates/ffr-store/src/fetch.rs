//! Fetch boundary between a list and its data source.

use std::future::Future;

use ffr_model::{FetchError, RecordSet};

use crate::list_model::FetchRequest;

/// Runs a [`FetchRequest`] against a data source.
///
/// The returned future must not borrow the fetcher; it is polled alongside
/// other outstanding requests while the list keeps accepting actions.
/// Closures `Fn(FetchRequest) -> impl Future` implement this trait.
pub trait Fetch<T, F, X = (), S = String> {
    fn fetch(
        &self,
        request: FetchRequest<F, S>,
    ) -> impl Future<Output = Result<RecordSet<T, X>, FetchError>> + 'static;
}

impl<T, F, X, S, C, Fut> Fetch<T, F, X, S> for C
where
    C: Fn(FetchRequest<F, S>) -> Fut,
    Fut: Future<Output = Result<RecordSet<T, X>, FetchError>> + 'static,
{
    fn fetch(
        &self,
        request: FetchRequest<F, S>,
    ) -> impl Future<Output = Result<RecordSet<T, X>, FetchError>> + 'static {
        self(request)
    }
}
