use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::escrow::Participant;
use crate::format::{format_currency, format_relative_time, status_label};
use crate::models::{Challenge, ChallengeStatus};

/// Display model for a challenge in the consumer listing.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeCard {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub status: ChallengeStatus,
    pub status_label: &'static str,
    pub stake_amount: i64,
    pub stake_display: String,
    pub escrow_total_display: String,
    pub created: String,
    pub challenger: Option<Participant>,
    pub challenged: Option<Participant>,
    /// Whether the join action should be offered at all.
    pub joinable: bool,
}

impl ChallengeCard {
    pub fn from_challenge(c: &Challenge, currency_symbol: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            category: c.category.clone(),
            status: c.status,
            status_label: status_label(c.status),
            stake_amount: c.stake_amount,
            stake_display: format_currency(c.stake_amount, currency_symbol),
            escrow_total_display: format_currency(c.escrow_total(), currency_symbol),
            created: format_relative_time(c.created_at, now),
            challenger: c.challenger.as_ref().map(Participant::from),
            challenged: c.challenged.as_ref().map(Participant::from),
            joinable: c.status.is_joinable(),
        }
    }
}
