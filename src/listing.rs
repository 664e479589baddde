use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Challenge;

/// Ordering applied to a challenge listing. Every key sorts descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Largest escrow total first.
    Amount,
    /// Newest first.
    #[default]
    Date,
    /// Highest identifier first.
    Id,
}

impl SortKey {
    /// Unknown keys fall back to date ordering.
    pub fn from_api_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "amount" => SortKey::Amount,
            "id" => SortKey::Id,
            _ => SortKey::Date,
        }
    }
}

impl<'de> Deserialize<'de> for SortKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(SortKey::from_api_str(&raw))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Amount => write!(f, "amount"),
            SortKey::Date => write!(f, "date"),
            SortKey::Id => write!(f, "id"),
        }
    }
}

/// Case-insensitive substring match on title, category or the decimal id.
/// A blank filter matches everything.
pub fn matches_filter(challenge: &Challenge, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    challenge.title.to_lowercase().contains(&needle)
        || challenge.category.to_lowercase().contains(&needle)
        || challenge.id.to_string().contains(&needle)
}

/// Filter then sort into a fresh list. The input is left untouched and the
/// sort is stable, so ties keep their listing order.
pub fn transform(challenges: &[Challenge], filter: &str, sort: SortKey) -> Vec<Challenge> {
    let mut out: Vec<Challenge> = challenges
        .iter()
        .filter(|c| matches_filter(c, filter))
        .cloned()
        .collect();

    match sort {
        SortKey::Amount => out.sort_by_key(|c| Reverse(c.escrow_total())),
        // `None` orders below every timestamp, so undated entries sink.
        SortKey::Date => out.sort_by_key(|c| Reverse(c.created_at)),
        SortKey::Id => out.sort_by_key(|c| Reverse(c.id)),
    }

    out
}
