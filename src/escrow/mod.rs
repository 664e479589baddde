use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::{avatar_initials, format_currency, format_relative_time, status_label};
use crate::listing::{transform, SortKey};
use crate::models::{ChallengeStatus, EscrowOverviewPayload, UserRef};

/// Local view state of the escrow dashboard.
///
/// Only `expanded` is interactive state in the usual sense; search and sort
/// are forwarded to the list transformer. None of it triggers a fetch: all
/// row details are already in the overview payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EscrowBoard {
    pub search: String,
    pub sort: SortKey,
    pub expanded: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscrowCounters {
    pub total_escrow: i64,
    pub total_escrow_display: String,
    pub pending_challenges: u32,
    pub holding_amount: i64,
    pub holding_amount_display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub id: String,
    pub username: String,
    pub initials: String,
    pub avatar_url: Option<String>,
}

impl From<&UserRef> for Participant {
    fn from(user: &UserRef) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            initials: avatar_initials(&user.username),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Extra fields shown only for the expanded row.
#[derive(Debug, Clone, Serialize)]
pub struct EscrowRowDetail {
    pub challenger: Option<Participant>,
    pub challenged: Option<Participant>,
    pub stake_amount: i64,
    pub stake_display: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscrowRow {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub status: ChallengeStatus,
    pub status_label: &'static str,
    pub escrow_entries: u32,
    pub escrow_total: i64,
    pub escrow_total_display: String,
    pub created: String,
    pub expanded: bool,
    pub detail: Option<EscrowRowDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EscrowView {
    pub counters: EscrowCounters,
    pub sort: SortKey,
    pub search: String,
    pub rows: Vec<EscrowRow>,
    /// Neutral empty-state text; `None` when there are rows to show.
    pub empty: Option<String>,
}

impl EscrowBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    /// Single-select expansion: opening a row closes any other, and toggling
    /// the open row closes it.
    pub fn toggle(&mut self, id: i64) {
        self.expanded = if self.expanded == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    pub fn view(
        &self,
        payload: &EscrowOverviewPayload,
        currency_symbol: &str,
        now: DateTime<Utc>,
    ) -> EscrowView {
        let stats = payload.stats;
        let counters = EscrowCounters {
            total_escrow: stats.total_escrow,
            total_escrow_display: format_currency(stats.total_escrow, currency_symbol),
            pending_challenges: stats.pending_challenges,
            holding_amount: stats.holding_amount,
            holding_amount_display: format_currency(stats.holding_amount, currency_symbol),
        };

        let rows: Vec<EscrowRow> = transform(&payload.challenges, &self.search, self.sort)
            .into_iter()
            .map(|c| {
                let expanded = self.expanded == Some(c.id);
                let escrow = c.escrow.unwrap_or_default();
                let detail = expanded.then(|| EscrowRowDetail {
                    challenger: c.challenger.as_ref().map(Participant::from),
                    challenged: c.challenged.as_ref().map(Participant::from),
                    stake_amount: c.stake_amount,
                    stake_display: format_currency(c.stake_amount, currency_symbol),
                    created_at: c.created_at,
                });

                EscrowRow {
                    id: c.id,
                    status_label: status_label(c.status),
                    status: c.status,
                    escrow_entries: escrow.count,
                    escrow_total: escrow.total_amount,
                    escrow_total_display: format_currency(escrow.total_amount, currency_symbol),
                    created: format_relative_time(c.created_at, now),
                    expanded,
                    detail,
                    title: c.title,
                    category: c.category,
                }
            })
            .collect();

        let empty = if !rows.is_empty() {
            None
        } else if self.search.trim().is_empty() {
            Some("No challenges are holding escrow.".to_string())
        } else {
            Some(format!("No escrow entries match \"{}\".", self.search.trim()))
        };

        EscrowView {
            counters,
            sort: self.sort,
            search: self.search.clone(),
            rows,
            empty,
        }
    }
}
