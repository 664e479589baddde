use std::time::Duration;

use wagerdesk::api::router::create_router;
use wagerdesk::config::AppConfig;
use wagerdesk::join::JoinSessions;
use wagerdesk::platform::PlatformClient;
use wagerdesk::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let platform = PlatformClient::from_config(&config)?;
    tracing::info!(
        platform = %config.platform_api_url,
        authenticated = config.platform_api_token.is_some(),
        "Platform client ready"
    );
    if config.admin_api_token.is_none() {
        tracing::warn!("ADMIN_API_TOKEN is not set; admin escrow routes are unauthenticated");
    }

    let metrics_handle = wagerdesk::metrics::init_metrics();
    let state = AppState::new(config, platform, metrics_handle);
    spawn_session_sweeper(state.sessions.clone(), state.config.join_session_ttl());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

/// Periodically drop join sessions whose modal was never closed.
fn spawn_session_sweeper(sessions: JoinSessions, ttl: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval((ttl / 2).max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let evicted = sessions.sweep().await;
            if evicted > 0 {
                tracing::info!(evicted, "Expired idle join sessions");
            }
        }
    });
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
