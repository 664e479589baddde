use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;
use super::ChallengeStatus;

/// A participant as embedded in challenge payloads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRef {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub username: String,
    #[serde(alias = "avatar")]
    pub avatar_url: Option<String>,
}

/// Escrow held against a single challenge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EscrowAggregate {
    #[serde(deserialize_with = "lenient::count")]
    pub count: u32,
    #[serde(alias = "total", deserialize_with = "lenient::int")]
    pub total_amount: i64,
}

/// Read-only snapshot of a challenge. Every field degrades to its zero value
/// when absent or malformed so a single bad record never drops a listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Challenge {
    #[serde(deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(alias = "stake", deserialize_with = "lenient::int")]
    pub stake_amount: i64,
    pub status: ChallengeStatus,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub challenger: Option<UserRef>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub challenged: Option<UserRef>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub escrow: Option<EscrowAggregate>,
}

impl Challenge {
    /// Escrow total used for amount ordering; challenges without escrow count as 0.
    pub fn escrow_total(&self) -> i64 {
        self.escrow.map(|e| e.total_amount).unwrap_or(0)
    }
}
