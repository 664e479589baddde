use serde::{Deserialize, Serialize};

use super::lenient;
use super::Challenge;

/// Platform-wide escrow aggregate. Point-in-time read, never derived locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EscrowStats {
    #[serde(deserialize_with = "lenient::int")]
    pub total_escrow: i64,
    #[serde(deserialize_with = "lenient::count")]
    pub pending_challenges: u32,
    #[serde(deserialize_with = "lenient::int")]
    pub holding_amount: i64,
}

/// Response body of the admin escrow read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EscrowOverviewPayload {
    pub stats: EscrowStats,
    #[serde(deserialize_with = "lenient::entries")]
    pub challenges: Vec<Challenge>,
}
