//! Display projections. Nothing here feeds back into stored values.

use chrono::{DateTime, Utc};

use crate::models::ChallengeStatus;

/// `12345` → `$12,345`. Negative amounts keep the sign ahead of the symbol.
pub fn format_currency(amount: i64, symbol: &str) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-{symbol}{grouped}")
    } else {
        format!("{symbol}{grouped}")
    }
}

/// Coarse "time ago" label. Anything older than a week shows the date.
pub fn format_relative_time(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(at) = at else {
        return "unknown".to_string();
    };

    let secs = (now - at).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 7 * 86_400 => format!("{}d ago", s / 86_400),
        _ => at.format("%b %-d, %Y").to_string(),
    }
}

pub fn status_label(status: ChallengeStatus) -> &'static str {
    match status {
        ChallengeStatus::Pending => "Pending",
        ChallengeStatus::Active => "Active",
        ChallengeStatus::Completed => "Completed",
        ChallengeStatus::Disputed => "Disputed",
        ChallengeStatus::Cancelled => "Cancelled",
        ChallengeStatus::Open => "Open",
        ChallengeStatus::Unknown => "Unknown",
    }
}

/// Fallback avatar text: first letter of up to two name parts, uppercased.
pub fn avatar_initials(username: &str) -> String {
    let initials: String = username
        .split(|c: char| c.is_whitespace() || c == '_' || c == '.' || c == '-')
        .filter_map(|part| part.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();

    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}
