//! Emergency-fund health: fixed status thresholds over months of expenses
//! covered.
//!
//! The fund itself is an ordinary goal (kind `EmergencyFund`) backed by the
//! same ledger; its target is derived from average monthly expenses and its
//! status is recomputed from the balance on every read, so it can never go
//! stale after a balance change.
use serde::{Deserialize, Serialize};

use crate::{EngineError, Goal, Money, ResultEngine};

/// Number of months of expenses a fully funded emergency fund covers.
pub const EMERGENCY_FUND_TARGET_MONTHS: i64 = 6;

/// Health of an emergency fund, derived from `months_covered = balance /
/// monthly_expenses`:
///
/// - `Secure` at ≥ 3 months
/// - `Warning` at ≥ 1 and < 3 months
/// - `Critical` below 1 month
///
/// Any jump between statuses is valid; a deposit may move a fund from
/// `Critical` straight to `Secure`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FundStatus {
    Critical,
    Warning,
    Secure,
}

impl FundStatus {
    /// Classifies a balance against average monthly expenses, both in minor
    /// units of the same currency. Exact integer comparisons, no division.
    #[must_use]
    pub fn classify(balance_minor: i64, monthly_expenses_minor: i64) -> Self {
        if balance_minor >= monthly_expenses_minor * 3 {
            Self::Secure
        } else if balance_minor >= monthly_expenses_minor {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secure => "SECURE",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Point-in-time view of an emergency fund.
///
/// Built from the goal and its fresh balance in one step, so status and
/// balance always agree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmergencyFundSnapshot {
    pub goal: Goal,
    pub monthly_expenses: Money,
    pub status: FundStatus,
    /// Months of expenses covered, rounded down to tenths (e.g. `8` = 0.8
    /// months). Kept as an integer so the engine stays float-free.
    pub months_covered_tenths: i64,
}

impl EmergencyFundSnapshot {
    pub(crate) fn build(goal: Goal) -> ResultEngine<Self> {
        let monthly_expenses = goal.monthly_expenses.ok_or_else(|| {
            EngineError::Validation("goal is not an emergency fund".to_string())
        })?;
        if !monthly_expenses.is_positive() {
            return Err(EngineError::Validation(
                "monthly expenses must be > 0".to_string(),
            ));
        }

        let status = FundStatus::classify(goal.current_amount.minor(), monthly_expenses.minor());
        let months_covered_tenths = if goal.current_amount.is_negative() {
            0
        } else {
            goal.current_amount.minor() * 10 / monthly_expenses.minor()
        };

        Ok(Self {
            goal,
            monthly_expenses,
            status,
            months_covered_tenths,
        })
    }
}

/// Derived target for an emergency fund: six months of average expenses.
pub(crate) fn derived_target(monthly_expenses: Money) -> ResultEngine<Money> {
    monthly_expenses.checked_mul(EMERGENCY_FUND_TARGET_MONTHS)
}
