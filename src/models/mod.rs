pub mod challenge;
pub mod escrow;
pub mod join;
pub mod lenient;

pub use challenge::{Challenge, EscrowAggregate, UserRef};
pub use escrow::{EscrowOverviewPayload, EscrowStats};
pub use join::{JoinOutcome, JoinRequest, JoinResponse};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// The binary choice a participant stakes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "YES" | "Y" => Some(Side::Yes),
            "NO" | "N" => Some(Side::No),
            _ => None,
        }
    }
}

/// Form input is matched case-insensitively; anything that is not a side
/// token is an error rather than a guess.
impl<'de> Deserialize<'de> for Side {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Side::from_api_str(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown side `{raw}`")))
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "YES"),
            Side::No => write!(f, "NO"),
        }
    }
}

// ---------------------------------------------------------------------------
// ChallengeStatus
// ---------------------------------------------------------------------------

/// Lifecycle state as reported by the backend. The client never transitions
/// a challenge itself apart from requesting a cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Active,
    Completed,
    Disputed,
    Cancelled,
    Open,
    #[default]
    Unknown,
}

impl ChallengeStatus {
    pub fn from_api_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" => ChallengeStatus::Pending,
            "active" => ChallengeStatus::Active,
            "completed" => ChallengeStatus::Completed,
            "disputed" => ChallengeStatus::Disputed,
            "cancelled" | "canceled" => ChallengeStatus::Cancelled,
            "open" => ChallengeStatus::Open,
            _ => ChallengeStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Pending => "pending",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Disputed => "disputed",
            ChallengeStatus::Cancelled => "cancelled",
            ChallengeStatus::Open => "open",
            ChallengeStatus::Unknown => "unknown",
        }
    }

    /// Whether the challenge can still be joined or accepted.
    pub fn is_joinable(&self) -> bool {
        matches!(self, ChallengeStatus::Pending | ChallengeStatus::Open)
    }
}

impl<'de> Deserialize<'de> for ChallengeStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = lenient::string(deserializer)?;
        Ok(ChallengeStatus::from_api_str(&raw))
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
