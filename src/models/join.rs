use serde::{Deserialize, Serialize};

use super::lenient;
use super::{Side, UserRef};

/// Body of `POST /challenges/{id}/join`.
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequest {
    /// Chosen side token, `YES` or `NO`.
    pub stake: Side,
    pub amount: i64,
}

/// Raw join response. `matched` is the only field the client branches on.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinResponse {
    pub matched: bool,
    #[serde(alias = "position", deserialize_with = "lenient::opt_count")]
    pub queue_position: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub opponent: Option<UserRef>,
    pub message: Option<String>,
}

/// What a join actually did, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinOutcome {
    /// Paired immediately; funds are committed.
    Matched { opponent: Option<UserRef> },
    /// Waiting for an opposing stake; funds are held. The position is shown
    /// exactly as the backend numbers it.
    Queued { position: Option<u32> },
}

impl From<JoinResponse> for JoinOutcome {
    fn from(resp: JoinResponse) -> Self {
        if resp.matched {
            JoinOutcome::Matched {
                opponent: resp.opponent,
            }
        } else {
            JoinOutcome::Queued {
                position: resp.queue_position,
            }
        }
    }
}

impl JoinOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, JoinOutcome::Matched { .. })
    }

    /// User-facing notice text for this outcome.
    pub fn message(&self) -> String {
        match self {
            JoinOutcome::Matched {
                opponent: Some(user),
            } if !user.username.is_empty() => format!(
                "Matched instantly with {}! Funds committed to escrow.",
                user.username
            ),
            JoinOutcome::Matched { .. } => {
                "Matched instantly! Funds committed to escrow.".to_string()
            }
            JoinOutcome::Queued {
                position: Some(pos),
            } => format!(
                "You're #{pos} in the queue. Funds held until a match is found."
            ),
            JoinOutcome::Queued { position: None } => {
                "You're in the queue. Funds held until a match is found.".to_string()
            }
        }
    }
}
