use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use wagerdesk::api::router::create_router;
use wagerdesk::config::AppConfig;
use wagerdesk::platform::PlatformClient;
use wagerdesk::AppState;

/// Challenge id the fake backend always refuses to join.
#[allow(dead_code)]
pub const FULL_CHALLENGE_ID: i64 = 99;

/// In-process stand-in for the wager platform backend.
pub struct FakePlatform {
    pub challenge_calls: AtomicUsize,
    pub escrow_calls: AtomicUsize,
    pub join_calls: AtomicUsize,
    pub balance: AtomicI64,
    pub match_instantly: AtomicBool,
    pub escrow_status: AtomicU16,
    pub last_join: Mutex<Option<Value>>,
    pub status_updates: Mutex<Vec<(i64, String)>>,
    pub accepted: Mutex<Vec<i64>>,
    /// Raw rows appended to the escrow overview as-is.
    pub escrow_extra_rows: Mutex<Vec<Value>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            challenge_calls: AtomicUsize::new(0),
            escrow_calls: AtomicUsize::new(0),
            join_calls: AtomicUsize::new(0),
            balance: AtomicI64::new(100_000),
            match_instantly: AtomicBool::new(true),
            escrow_status: AtomicU16::new(200),
            last_join: Mutex::new(None),
            status_updates: Mutex::new(Vec::new()),
            accepted: Mutex::new(Vec::new()),
            escrow_extra_rows: Mutex::new(Vec::new()),
        }
    }
}

#[allow(dead_code)]
impl FakePlatform {
    pub fn join_calls(&self) -> usize {
        self.join_calls.load(Ordering::SeqCst)
    }

    pub fn challenge_calls(&self) -> usize {
        self.challenge_calls.load(Ordering::SeqCst)
    }

    pub fn escrow_calls(&self) -> usize {
        self.escrow_calls.load(Ordering::SeqCst)
    }
}

fn challenge_fixtures() -> Value {
    json!([
        {
            "id": 1,
            "title": "Lakers win tonight",
            "category": "basketball",
            "stakeAmount": 5000,
            "status": "open",
            "createdAt": "2024-06-01T10:00:00Z",
            "challenger": { "id": 11, "username": "ada lovelace" },
            "escrow": { "count": 1, "totalAmount": 5000 }
        },
        {
            "id": 2,
            "title": "BTC above six figures",
            "category": "crypto",
            "stakeAmount": 20000,
            "status": "active",
            "createdAt": "2024-06-02T10:00:00Z",
            "challenger": { "id": "12", "username": "grace" },
            "challenged": { "id": "13", "username": "linus", "avatarUrl": "https://cdn.example/l.png" },
            "escrow": { "count": 2, "total": 40000 }
        },
        {
            "id": 3,
            "title": "Rain in London",
            "category": "weather",
            "stake": "1000",
            "status": "pending",
            "createdAt": "2024-05-30T10:00:00Z",
            "escrow": { "count": 1, "totalAmount": 1000 }
        },
        "not a challenge"
    ])
}

async fn list_challenges(State(fake): State<Arc<FakePlatform>>) -> Json<Value> {
    fake.challenge_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "challenges": challenge_fixtures() }))
}

async fn escrow_overview(State(fake): State<Arc<FakePlatform>>) -> Response {
    fake.escrow_calls.fetch_add(1, Ordering::SeqCst);

    let status = fake.escrow_status.load(Ordering::SeqCst);
    if status != 200 {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, Json(json!({ "error": "admin access required" }))).into_response();
    }

    let mut challenges = challenge_fixtures();
    if let Some(list) = challenges.as_array_mut() {
        list.retain(|c| c.is_object());
        list.extend(fake.escrow_extra_rows.lock().unwrap().iter().cloned());
    }
    Json(json!({
        "stats": {
            "totalEscrow": 46000,
            "pendingChallenges": 1,
            "holdingAmount": 1000
        },
        "challenges": challenges
    }))
    .into_response()
}

async fn wallet_balance(State(fake): State<Arc<FakePlatform>>) -> Json<Value> {
    Json(json!({ "balance": fake.balance.load(Ordering::SeqCst) }))
}

async fn join(
    State(fake): State<Arc<FakePlatform>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    fake.join_calls.fetch_add(1, Ordering::SeqCst);
    *fake.last_join.lock().unwrap() = Some(body);

    if id == FULL_CHALLENGE_ID {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "challenge already full" })),
        )
            .into_response();
    }

    if fake.match_instantly.load(Ordering::SeqCst) {
        Json(json!({
            "matched": true,
            "opponent": { "id": "12", "username": "grace" }
        }))
        .into_response()
    } else {
        Json(json!({ "matched": false, "queuePosition": 2 })).into_response()
    }
}

async fn accept(State(fake): State<Arc<FakePlatform>>, Path(id): Path<i64>) -> Json<Value> {
    fake.accepted.lock().unwrap().push(id);
    Json(json!({ "ok": true }))
}

async fn update_status(
    State(fake): State<Arc<FakePlatform>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let status = body["status"].as_str().unwrap_or_default().to_string();
    fake.status_updates.lock().unwrap().push((id, status));
    Json(json!({ "ok": true }))
}

/// Serve the fake backend on an ephemeral port and return its base URL.
pub async fn spawn_platform(fake: Arc<FakePlatform>) -> String {
    let app = Router::new()
        .route("/challenges", get(list_challenges))
        .route("/admin/escrow", get(escrow_overview))
        .route("/wallet/balance", get(wallet_balance))
        .route("/challenges/:id/join", post(join))
        .route("/challenges/:id/accept", post(accept))
        .route("/challenges/:id/status", patch(update_status))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake platform");
    let addr = listener.local_addr().expect("fake platform has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{addr}")
}

/// Build the service router against a fresh fake backend.
#[allow(dead_code)]
pub async fn build_test_app() -> (Router, Arc<FakePlatform>) {
    build_test_app_with(|_| {}).await
}

pub async fn build_test_app_with(
    configure: impl FnOnce(&mut AppConfig),
) -> (Router, Arc<FakePlatform>) {
    let fake = Arc::new(FakePlatform::default());
    let base_url = spawn_platform(Arc::clone(&fake)).await;

    let mut config = AppConfig::for_platform(base_url);
    config.join_cooldown_ms = 100;
    config.query_retry_attempts = 1;
    configure(&mut config);

    let platform = PlatformClient::from_config(&config).expect("Failed to build platform client");
    let metrics_handle = wagerdesk::metrics::init_metrics();
    let state = AppState::new(config, platform, metrics_handle);

    (create_router(state), fake)
}
