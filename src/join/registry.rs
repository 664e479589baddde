use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::gauge;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::session::JoinSession;

struct Entry {
    session: Arc<JoinSession>,
    last_seen: Instant,
}

/// Open join sessions keyed by id, one per open modal.
///
/// A session nobody has touched for `idle_ttl` is treated as abandoned
/// (closed tab, crashed client) and evicted on the next `open`, `get` or
/// `sweep`.
#[derive(Clone)]
pub struct JoinSessions {
    cooldown: Duration,
    idle_ttl: Duration,
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl JoinSessions {
    pub fn new(cooldown: Duration, idle_ttl: Duration) -> Self {
        Self {
            cooldown,
            idle_ttl,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn open(&self, challenge_id: i64, default_amount: i64) -> Arc<JoinSession> {
        let session = Arc::new(JoinSession::new(challenge_id, default_amount, self.cooldown));
        let mut sessions = self.inner.write().await;
        self.evict_idle(&mut sessions);
        sessions.insert(
            session.id(),
            Entry {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        gauge!("open_join_sessions").set(sessions.len() as f64);

        tracing::debug!(session = %session.id(), challenge_id, "Join session opened");
        session
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<JoinSession>> {
        let mut sessions = self.inner.write().await;
        self.evict_idle(&mut sessions);
        gauge!("open_join_sessions").set(sessions.len() as f64);

        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// Unmount and forget a session. Returns false if it was not open.
    pub async fn close(&self, id: &Uuid) -> bool {
        let mut sessions = self.inner.write().await;
        let Some(entry) = sessions.remove(id) else {
            return false;
        };
        entry.session.unmount();
        gauge!("open_join_sessions").set(sessions.len() as f64);

        tracing::debug!(session = %id, "Join session closed");
        true
    }

    /// Evict abandoned sessions. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.inner.write().await;
        let evicted = self.evict_idle(&mut sessions);
        gauge!("open_join_sessions").set(sessions.len() as f64);
        evicted
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Entry>) -> usize {
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let alive = entry.last_seen.elapsed() < self.idle_ttl;
            if !alive {
                entry.session.unmount();
                tracing::debug!(session = %id, "Join session expired");
            }
            alive
        });
        before - sessions.len()
    }
}
