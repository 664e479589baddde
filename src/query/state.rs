use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use metrics::counter;
use serde::Serialize;
use tokio::sync::RwLock;

use super::client::{QueryClient, QueryKey};
use crate::platform::PlatformError;

/// What a view sees for a read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QueryState<T> {
    /// Never fetched and nothing in flight.
    Idle,
    /// First fetch in flight, nothing to show yet.
    Loading,
    Ready { data: T },
    /// The last fetch failed. `stale` is the previous snapshot, left intact.
    Failed {
        error: String,
        status: Option<u16>,
        stale: Option<T>,
    },
}

impl<T> QueryState<T> {
    pub fn label(&self) -> &'static str {
        match self {
            QueryState::Idle => "idle",
            QueryState::Loading => "loading",
            QueryState::Ready { .. } => "ready",
            QueryState::Failed { .. } => "failed",
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Ready { data } => Some(data),
            QueryState::Failed { stale, .. } => stale.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// One attempt. Used for admin reads so a 401/403 shows up immediately.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Up to `attempts` tries with linear backoff, retrying only transport
    /// errors and 5xx.
    pub fn standard(attempts: u32) -> Self {
        Self {
            max_attempts: attempts.max(1),
            backoff: Duration::from_millis(200),
        }
    }
}

struct Snapshot<T> {
    data: T,
    fetched_at: Instant,
    generation: u64,
}

/// A single cached read.
pub struct Query<T> {
    key: QueryKey,
    policy: RetryPolicy,
    stale_after: Duration,
    slot: RwLock<Option<Snapshot<T>>>,
    fetching: AtomicBool,
}

impl<T: Clone + Send + Sync> Query<T> {
    pub fn new(key: QueryKey, policy: RetryPolicy, stale_after: Duration) -> Self {
        Self {
            key,
            policy,
            stale_after,
            slot: RwLock::new(None),
            fetching: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> QueryKey {
        self.key
    }

    /// Current state without touching the network.
    pub async fn peek(&self) -> QueryState<T> {
        match &*self.slot.read().await {
            Some(snap) => QueryState::Ready {
                data: snap.data.clone(),
            },
            None if self.fetching.load(Ordering::Acquire) => QueryState::Loading,
            None => QueryState::Idle,
        }
    }

    /// Serve the cached snapshot when it is fresh, otherwise run `fetcher`
    /// under the retry policy. A failed fetch never clears the snapshot.
    pub async fn fetch<F, Fut>(&self, client: &QueryClient, fetcher: F) -> QueryState<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        let generation = client.generation(self.key);

        if let Some(snap) = &*self.slot.read().await {
            if snap.generation == generation && snap.fetched_at.elapsed() < self.stale_after {
                return QueryState::Ready {
                    data: snap.data.clone(),
                };
            }
        }

        self.load(generation, &fetcher).await
    }

    /// Fetch regardless of the cached snapshot's age. Used where acting on
    /// an old value would be wrong, such as a funds check.
    pub async fn refetch<F, Fut>(&self, client: &QueryClient, fetcher: F) -> QueryState<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        self.load(client.generation(self.key), &fetcher).await
    }

    async fn load<F, Fut>(&self, generation: u64, fetcher: &F) -> QueryState<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        self.fetching.store(true, Ordering::Release);
        let result = self.fetch_with_retry(fetcher).await;
        self.fetching.store(false, Ordering::Release);

        match result {
            Ok(data) => {
                *self.slot.write().await = Some(Snapshot {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                    generation,
                });
                QueryState::Ready { data }
            }
            Err(e) => {
                counter!("query_failures_total", "query" => self.key.to_string()).increment(1);
                tracing::warn!(query = %self.key, error = %e, "Query fetch failed");
                QueryState::Failed {
                    error: e.to_string(),
                    status: e.status(),
                    stale: self.slot.read().await.as_ref().map(|s| s.data.clone()),
                }
            }
        }
    }

    async fn fetch_with_retry<F, Fut>(&self, fetcher: &F) -> Result<T, PlatformError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        let mut attempt = 1;
        loop {
            match fetcher().await {
                Ok(data) => return Ok(data),
                Err(e) if attempt < self.policy.max_attempts && e.is_retryable() => {
                    tracing::debug!(
                        query = %self.key,
                        attempt,
                        error = %e,
                        "Retrying query"
                    );
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
