use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

/// Cached reads that can be invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKey {
    Challenges,
    AdminEscrow,
    WalletBalance,
}

impl QueryKey {
    pub const ALL: [QueryKey; 3] = [
        QueryKey::Challenges,
        QueryKey::AdminEscrow,
        QueryKey::WalletBalance,
    ];

    fn index(self) -> usize {
        match self {
            QueryKey::Challenges => 0,
            QueryKey::AdminEscrow => 1,
            QueryKey::WalletBalance => 2,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Challenges => write!(f, "challenges"),
            QueryKey::AdminEscrow => write!(f, "admin_escrow"),
            QueryKey::WalletBalance => write!(f, "wallet_balance"),
        }
    }
}

/// Owns the invalidation signal shared by every cached query.
///
/// Each key carries a generation counter. A cached snapshot remembers the
/// generation it was fetched under and is stale once the counter moves.
/// Every invalidation is also broadcast so subscribers (the dashboard
/// WebSocket) can refetch on their own.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<QueryClientInner>,
}

struct QueryClientInner {
    generations: [AtomicU64; 3],
    tx: broadcast::Sender<QueryKey>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(QueryClientInner {
                generations: Default::default(),
                tx,
            }),
        }
    }

    pub fn generation(&self, key: QueryKey) -> u64 {
        self.inner.generations[key.index()].load(Ordering::Acquire)
    }

    pub fn invalidate(&self, key: QueryKey) {
        let generation = self.inner.generations[key.index()].fetch_add(1, Ordering::AcqRel) + 1;
        // No receivers is fine; nobody is watching right now.
        let _ = self.inner.tx.send(key);
        tracing::debug!(key = %key, generation, "Query invalidated");
    }

    pub fn invalidate_many(&self, keys: &[QueryKey]) {
        for key in keys {
            self.invalidate(*key);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.inner.tx.subscribe()
    }
}
