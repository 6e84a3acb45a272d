//! Resilience layer shared by every upstream client
//!
//! - [`Cache`]: TTL cache of provider results
//! - [`RateLimiter`]: fixed-window admission per identity
//! - [`RetryPolicy`]: bounded retry with linear backoff

pub mod cache;
pub mod rate_limit;
pub mod retry;

pub use cache::Cache;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;

use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::UpstreamError;

/// Serve `key` from `cache`, or run `operation` under `retry` and cache the
/// result. Failures are never cached.
pub async fn cached_call<T, F, Fut>(
    cache: &Cache,
    key: &str,
    retry: &RetryPolicy,
    operation: F,
) -> Result<T, UpstreamError>
where
    T: Serialize + DeserializeOwned + Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    if let Some(cached) = cache.get::<T>(key) {
        debug!("Cache hit for {key}");
        return Ok(cached);
    }

    let value = retry.run(key, operation).await?;

    if let Err(e) = cache.put(key, &value) {
        warn!("Failed to cache {key}: {e}");
    }
    Ok(value)
}
