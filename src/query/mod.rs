pub mod client;
pub mod state;

pub use client::{QueryClient, QueryKey};
pub use state::{Query, QueryState, RetryPolicy};

use crate::config::AppConfig;
use crate::models::{Challenge, EscrowOverviewPayload};
use crate::platform::PlatformClient;

/// The reads this service caches, each with its own retry policy.
pub struct Queries {
    pub challenges: Query<Vec<Challenge>>,
    pub admin_escrow: Query<EscrowOverviewPayload>,
    pub wallet_balance: Query<i64>,
}

impl Queries {
    pub fn new(config: &AppConfig) -> Self {
        let stale_after = config.query_stale_after();
        let user_policy = RetryPolicy::standard(config.query_retry_attempts);

        Self {
            challenges: Query::new(QueryKey::Challenges, user_policy, stale_after),
            // Admin reads never retry so authorization failures are not masked.
            admin_escrow: Query::new(QueryKey::AdminEscrow, RetryPolicy::none(), stale_after),
            wallet_balance: Query::new(QueryKey::WalletBalance, user_policy, stale_after),
        }
    }

    pub async fn challenges(
        &self,
        client: &QueryClient,
        platform: &PlatformClient,
    ) -> QueryState<Vec<Challenge>> {
        self.challenges
            .fetch(client, || platform.get_challenges())
            .await
    }

    pub async fn admin_escrow(
        &self,
        client: &QueryClient,
        platform: &PlatformClient,
    ) -> QueryState<EscrowOverviewPayload> {
        self.admin_escrow
            .fetch(client, || platform.get_escrow_overview())
            .await
    }

    /// Always read through to the backend; the balance guards a funds check.
    pub async fn wallet_balance(
        &self,
        client: &QueryClient,
        platform: &PlatformClient,
    ) -> QueryState<i64> {
        self.wallet_balance
            .refetch(client, || platform.get_wallet_balance())
            .await
    }

    /// Cache state of every read, without fetching.
    pub async fn cache_states(&self) -> Vec<(QueryKey, &'static str)> {
        vec![
            (self.challenges.key(), self.challenges.peek().await.label()),
            (self.admin_escrow.key(), self.admin_escrow.peek().await.label()),
            (self.wallet_balance.key(), self.wallet_balance.peek().await.label()),
        ]
    }
}
