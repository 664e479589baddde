use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::validation::{check_balance, validate_selection, JoinViolation};
use crate::models::{JoinOutcome, JoinRequest, Side};
use crate::platform::{ChallengeApi, PlatformError};
use crate::query::{QueryClient, QueryKey};

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("a join request is already in progress")]
    Busy { phase: JoinPhase },

    #[error(transparent)]
    Invalid(#[from] JoinViolation),

    /// Rejection from the platform, reason passed through verbatim.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("join session is closed")]
    Closed,

    #[error("{message}")]
    BalanceUnavailable { status: Option<u16>, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPhase {
    /// Selectable; a submit is accepted.
    Ready,
    /// One join call is in flight.
    Submitting,
    /// Succeeded; inputs stay disabled until the cooldown elapses.
    CoolingDown,
}

/// Toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum JoinNotice {
    Success { message: String, outcome: JoinOutcome },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinSessionView {
    pub id: Uuid,
    pub challenge_id: i64,
    pub side: Option<Side>,
    pub amount: i64,
    pub phase: JoinPhase,
    pub can_submit: bool,
    pub notice: Option<JoinNotice>,
}

struct SessionState {
    side: Option<Side>,
    amount: i64,
    phase: JoinPhase,
    notice: Option<JoinNotice>,
}

/// State behind one open join modal.
///
/// At most one join call is in flight per session: `submit` moves the phase
/// out of `Ready` under the lock before the request is issued and only a
/// failure or the post-success cooldown moves it back. The lock is released
/// while the request is outstanding.
pub struct JoinSession {
    id: Uuid,
    challenge_id: i64,
    default_amount: i64,
    cooldown: Duration,
    mounted: AtomicBool,
    state: Mutex<SessionState>,
}

impl JoinSession {
    pub fn new(challenge_id: i64, default_amount: i64, cooldown: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            challenge_id,
            default_amount,
            cooldown,
            mounted: AtomicBool::new(true),
            state: Mutex::new(SessionState {
                side: None,
                amount: default_amount,
                phase: JoinPhase::Ready,
                notice: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn challenge_id(&self) -> i64 {
        self.challenge_id
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// The modal went away. An in-flight request still completes, but its
    /// result no longer touches this session.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    pub async fn view(&self) -> JoinSessionView {
        let state = self.state.lock().await;
        JoinSessionView {
            id: self.id,
            challenge_id: self.challenge_id,
            side: state.side,
            amount: state.amount,
            phase: state.phase,
            can_submit: state.phase == JoinPhase::Ready && self.is_mounted(),
            notice: state.notice.clone(),
        }
    }

    pub async fn phase(&self) -> JoinPhase {
        self.state.lock().await.phase
    }

    /// Update the selection. Inputs are disabled outside `Ready`.
    pub async fn select(&self, side: Option<Side>, amount: Option<i64>) -> Result<(), JoinError> {
        let mut state = self.state.lock().await;
        if state.phase != JoinPhase::Ready {
            return Err(JoinError::Busy { phase: state.phase });
        }
        state.side = side;
        if let Some(amount) = amount {
            state.amount = amount;
        }
        Ok(())
    }

    /// Validate against a known balance and issue exactly one join call.
    pub async fn submit<A: ChallengeApi>(
        self: &Arc<Self>,
        api: &A,
        queries: &QueryClient,
        balance: i64,
    ) -> Result<JoinOutcome, JoinError> {
        self.submit_with(api, queries, async move { Ok(balance) })
            .await
    }

    /// Validate and issue exactly one join call, resolving the balance only
    /// after the selection itself has passed.
    ///
    /// On success every cached read the join can affect is invalidated, the
    /// notice reflects the backend's `matched` flag and the session cools
    /// down before returning to its initial selection. On failure the
    /// backend's reason becomes the notice and the session is selectable
    /// again straight away; nothing is retried.
    pub async fn submit_with<A, B>(
        self: &Arc<Self>,
        api: &A,
        queries: &QueryClient,
        balance: B,
    ) -> Result<JoinOutcome, JoinError>
    where
        A: ChallengeApi,
        B: Future<Output = Result<i64, JoinError>>,
    {
        if !self.is_mounted() {
            return Err(JoinError::Closed);
        }

        let (side, amount) = {
            let mut state = self.state.lock().await;
            if state.phase != JoinPhase::Ready {
                return Err(JoinError::Busy { phase: state.phase });
            }

            match validate_selection(state.side, state.amount) {
                Ok(side) => {
                    state.phase = JoinPhase::Submitting;
                    state.notice = None;
                    (side, state.amount)
                }
                Err(violation) => {
                    self.reject(&mut state, &violation);
                    return Err(violation.into());
                }
            }
        };

        let balance_check = match balance.await {
            Ok(balance) => check_balance(amount, balance).map_err(JoinError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = balance_check {
            let mut state = self.state.lock().await;
            state.phase = JoinPhase::Ready;
            match &e {
                JoinError::Invalid(violation) => self.reject(&mut state, violation),
                other => self.record_error(&mut state, other.to_string()),
            }
            return Err(e);
        }

        let request = JoinRequest {
            stake: side,
            amount,
        };
        let result = api.join_challenge(self.challenge_id, &request).await;

        match result {
            Ok(resp) => {
                let outcome = JoinOutcome::from(resp);
                queries.invalidate_many(&QueryKey::ALL);

                if outcome.is_matched() {
                    counter!("join_matched_total").increment(1);
                } else {
                    counter!("join_queued_total").increment(1);
                }

                let mut state = self.state.lock().await;
                state.phase = JoinPhase::CoolingDown;
                if self.is_mounted() {
                    state.notice = Some(JoinNotice::Success {
                        message: outcome.message(),
                        outcome: outcome.clone(),
                    });
                } else {
                    tracing::debug!(session = %self.id, "Join completed after close; result ignored");
                }
                drop(state);

                self.schedule_reset();
                Ok(outcome)
            }
            Err(e) => {
                counter!("join_failed_total").increment(1);
                tracing::warn!(
                    session = %self.id,
                    challenge_id = self.challenge_id,
                    error = %e,
                    "Join request failed"
                );

                let mut state = self.state.lock().await;
                state.phase = JoinPhase::Ready;
                self.record_error(&mut state, e.to_string());
                Err(e.into())
            }
        }
    }

    fn reject(&self, state: &mut SessionState, violation: &JoinViolation) {
        counter!("join_rejected_total", "reason" => violation.code()).increment(1);
        tracing::info!(
            session = %self.id,
            challenge_id = self.challenge_id,
            reason = violation.code(),
            "Join rejected before dispatch"
        );
        self.record_error(state, violation.to_string());
    }

    fn record_error(&self, state: &mut SessionState, message: String) {
        if self.is_mounted() {
            state.notice = Some(JoinNotice::Error { message });
        }
    }

    /// Back to the initial selection once the cooldown has passed. The
    /// notice is left alone so the outcome stays readable.
    fn schedule_reset(self: &Arc<Self>) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(session.cooldown).await;
            let mut state = session.state.lock().await;
            state.phase = JoinPhase::Ready;
            state.side = None;
            state.amount = session.default_amount;
            tracing::debug!(session = %session.id, "Join session reset after cooldown");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JoinResponse, UserRef};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Records every call; optionally blocks until released.
    struct FakeApi {
        calls: AtomicUsize,
        response: Result<JoinResponse, (u16, String)>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeApi {
        fn answering(response: JoinResponse) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(response),
                gate: None,
            }
        }

        fn rejecting(status: u16, message: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err((status, message.to_string())),
                gate: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChallengeApi for FakeApi {
        async fn join_challenge(
            &self,
            _challenge_id: i64,
            _request: &JoinRequest,
        ) -> Result<JoinResponse, PlatformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.response {
                Ok(resp) => Ok(resp.clone()),
                Err((status, message)) => Err(PlatformError::Rejected {
                    status: *status,
                    message: message.clone(),
                }),
            }
        }
    }

    fn queued(position: u32) -> JoinResponse {
        JoinResponse {
            matched: false,
            queue_position: Some(position),
            ..Default::default()
        }
    }

    fn session(cooldown_ms: u64) -> Arc<JoinSession> {
        Arc::new(JoinSession::new(7, 1_000, Duration::from_millis(cooldown_ms)))
    }

    #[tokio::test]
    async fn test_no_side_fails_without_call() {
        let api = FakeApi::answering(queued(1));
        let s = session(10);

        let err = s.submit(&api, &QueryClient::new(), 10_000).await.unwrap_err();
        assert!(matches!(err, JoinError::Invalid(JoinViolation::NoSideSelected)));
        assert_eq!(api.calls(), 0);
        assert_eq!(s.phase().await, JoinPhase::Ready);
    }

    #[tokio::test]
    async fn test_insufficient_balance_fails_without_call() {
        let api = FakeApi::answering(queued(1));
        let s = session(10);
        s.select(Some(Side::Yes), Some(5_000)).await.unwrap();

        let err = s.submit(&api, &QueryClient::new(), 3_000).await.unwrap_err();
        assert_eq!(err.to_string(), "insufficient balance");
        assert_eq!(api.calls(), 0);

        let view = s.view().await;
        assert_eq!(
            view.notice,
            Some(JoinNotice::Error {
                message: "insufficient balance".into()
            })
        );
    }

    #[tokio::test]
    async fn test_matched_join_reports_pairing_and_invalidates() {
        let api = FakeApi::answering(JoinResponse {
            matched: true,
            opponent: Some(UserRef {
                id: "9".into(),
                username: "grace".into(),
                avatar_url: None,
            }),
            ..Default::default()
        });
        let queries = QueryClient::new();
        let s = session(1_000);
        s.select(Some(Side::No), None).await.unwrap();

        let outcome = s.submit(&api, &queries, 10_000).await.unwrap();
        assert!(outcome.is_matched());
        assert_eq!(api.calls(), 1);
        assert_eq!(queries.generation(QueryKey::Challenges), 1);
        assert_eq!(queries.generation(QueryKey::AdminEscrow), 1);

        let view = s.view().await;
        assert_eq!(view.phase, JoinPhase::CoolingDown);
        assert!(!view.can_submit);
        match view.notice {
            Some(JoinNotice::Success { message, .. }) => {
                assert!(message.contains("Matched instantly with grace"))
            }
            other => panic!("unexpected notice: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_queued_join_reports_position() {
        let api = FakeApi::answering(queued(3));
        let queries = QueryClient::new();
        let s = session(1_000);
        s.select(Some(Side::Yes), Some(500)).await.unwrap();

        let outcome = s.submit(&api, &queries, 500).await.unwrap();
        assert_eq!(outcome, JoinOutcome::Queued { position: Some(3) });
        assert_eq!(queries.generation(QueryKey::Challenges), 1);
        assert!(outcome.message().contains("#3 in the queue"));
    }

    #[tokio::test]
    async fn test_cooldown_blocks_then_resets() {
        let api = FakeApi::answering(queued(1));
        let s = session(50);
        s.select(Some(Side::Yes), Some(200)).await.unwrap();
        s.submit(&api, &QueryClient::new(), 1_000).await.unwrap();

        // Disabled during the cooldown.
        assert!(matches!(
            s.submit(&api, &QueryClient::new(), 1_000).await,
            Err(JoinError::Busy {
                phase: JoinPhase::CoolingDown
            })
        ));
        assert!(s.select(Some(Side::No), None).await.is_err());
        assert_eq!(api.calls(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;

        let view = s.view().await;
        assert_eq!(view.phase, JoinPhase::Ready);
        assert_eq!(view.side, None);
        assert_eq!(view.amount, 1_000);
    }

    #[tokio::test]
    async fn test_single_request_in_flight() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            gate: Some(Arc::clone(&gate)),
            ..FakeApi::answering(queued(2))
        });
        let queries = QueryClient::new();
        let s = session(10);
        s.select(Some(Side::Yes), Some(100)).await.unwrap();

        let first = {
            let (s, api, queries) = (Arc::clone(&s), Arc::clone(&api), queries.clone());
            tokio::spawn(async move { s.submit(api.as_ref(), &queries, 1_000).await })
        };

        while s.phase().await != JoinPhase::Submitting {
            tokio::task::yield_now().await;
        }

        let second = s.submit(api.as_ref(), &queries, 1_000).await;
        assert!(matches!(
            second,
            Err(JoinError::Busy {
                phase: JoinPhase::Submitting
            })
        ));

        gate.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejection_surfaces_reason_without_retry() {
        let api = FakeApi::rejecting(409, "challenge already full");
        let queries = QueryClient::new();
        let s = session(10);
        s.select(Some(Side::No), Some(100)).await.unwrap();

        let err = s.submit(&api, &queries, 1_000).await.unwrap_err();
        assert_eq!(err.to_string(), "challenge already full");
        assert_eq!(api.calls(), 1);
        assert_eq!(queries.generation(QueryKey::Challenges), 0);

        let view = s.view().await;
        assert_eq!(view.phase, JoinPhase::Ready);
        assert_eq!(view.side, Some(Side::No));
        assert_eq!(
            view.notice,
            Some(JoinNotice::Error {
                message: "challenge already full".into()
            })
        );
    }

    #[tokio::test]
    async fn test_balance_not_resolved_for_invalid_selection() {
        let api = FakeApi::answering(queued(1));
        let s = session(10);
        let resolved = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&resolved);
        let err = s
            .submit_with(&api, &QueryClient::new(), async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(10_000)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, JoinError::Invalid(JoinViolation::NoSideSelected)));
        assert_eq!(resolved.load(Ordering::SeqCst), 0);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_balance_failure_releases_session() {
        let api = FakeApi::answering(queued(1));
        let s = session(10);
        s.select(Some(Side::Yes), Some(100)).await.unwrap();

        let err = s
            .submit_with(&api, &QueryClient::new(), async {
                Err(JoinError::BalanceUnavailable {
                    status: Some(503),
                    message: "wallet service unavailable".into(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "wallet service unavailable");
        assert_eq!(api.calls(), 0);

        let view = s.view().await;
        assert_eq!(view.phase, JoinPhase::Ready);
        assert!(view.can_submit);
    }

    #[tokio::test]
    async fn test_result_after_unmount_is_ignored() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            gate: Some(Arc::clone(&gate)),
            ..FakeApi::answering(queued(5))
        });
        let queries = QueryClient::new();
        let s = session(10);
        s.select(Some(Side::Yes), Some(100)).await.unwrap();

        let pending = {
            let (s, api, queries) = (Arc::clone(&s), Arc::clone(&api), queries.clone());
            tokio::spawn(async move { s.submit(api.as_ref(), &queries, 1_000).await })
        };
        while s.phase().await != JoinPhase::Submitting {
            tokio::task::yield_now().await;
        }

        s.unmount();
        gate.notify_one();

        // The call still completes and the listing is still invalidated.
        assert!(pending.await.unwrap().is_ok());
        assert_eq!(queries.generation(QueryKey::Challenges), 1);
        assert!(s.view().await.notice.is_none());

        assert!(matches!(
            s.submit(api.as_ref(), &queries, 1_000).await,
            Err(JoinError::Closed)
        ));
    }
}
