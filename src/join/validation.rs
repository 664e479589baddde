use thiserror::Error;

use crate::models::Side;

/// Join preconditions checked before any request leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinViolation {
    #[error("select a side")]
    NoSideSelected,

    #[error("stake must be positive")]
    NonPositiveStake { amount: i64 },

    #[error("insufficient balance")]
    InsufficientBalance { stake: i64, balance: i64 },
}

impl JoinViolation {
    /// Every value `code` can return.
    pub const CODES: [&'static str; 3] = ["no_side", "non_positive_stake", "insufficient_balance"];

    /// Stable label for metrics and logs.
    pub fn code(&self) -> &'static str {
        match self {
            JoinViolation::NoSideSelected => "no_side",
            JoinViolation::NonPositiveStake { .. } => "non_positive_stake",
            JoinViolation::InsufficientBalance { .. } => "insufficient_balance",
        }
    }
}

/// Checks that need nothing but the form itself.
pub fn validate_selection(side: Option<Side>, amount: i64) -> Result<Side, JoinViolation> {
    let side = side.ok_or(JoinViolation::NoSideSelected)?;

    if amount <= 0 {
        return Err(JoinViolation::NonPositiveStake { amount });
    }

    Ok(side)
}

pub fn check_balance(amount: i64, balance: i64) -> Result<(), JoinViolation> {
    if amount > balance {
        return Err(JoinViolation::InsufficientBalance {
            stake: amount,
            balance,
        });
    }
    Ok(())
}
