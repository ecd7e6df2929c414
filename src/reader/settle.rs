//! All-settle join support.
//!
//! Each sub-query of an aggregate read is wrapped in [`settle`], which pairs it
//! with a default. Joining settled futures can never fail: a rejected branch
//! contributes its default and the others keep their values.

use eyre::Result;
use std::future::Future;
use tracing::debug;

/// Await `query`, substituting `default` if it fails
pub async fn settle<T, F>(label: &'static str, query: F, default: T) -> T
where
    F: Future<Output = Result<T>>,
{
    match query.await {
        Ok(value) => value,
        Err(e) => {
            debug!("{} failed, using default: {}", label, e);
            default
        }
    }
}

/// Like [`settle`] but only issues the query when `input` is present
pub async fn settle_if<I, T, F, Q>(label: &'static str, input: Option<I>, query: Q, default: T) -> T
where
    Q: FnOnce(I) -> F,
    F: Future<Output = Result<T>>,
{
    match input {
        Some(input) => settle(label, query(input), default).await,
        None => default,
    }
}
