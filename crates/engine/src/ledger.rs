//! The module contains the `ContributionEntry` type, the immutable movement
//! record of the contribution ledger.
//!
//! Entries are append-only: history is never mutated, a mistake is undone by
//! inserting a compensating entry. A goal's balance is always the sum of its
//! signed entries, replaying the same ordered log reconstructs the same
//! balance.
use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Money;

/// A signed movement against a goal.
///
/// - positive `amount` = deposit
/// - negative `amount` = withdrawal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContributionEntry {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub amount: Money,
    /// When the movement occurred (caller-supplied, may differ from
    /// `created_at`).
    pub date: DateTime<Utc>,
    /// Free-form motivation; mandatory for withdrawals from protected goals.
    pub reason: Option<String>,
    /// Set when this entry was generated by distribution fan-out or by a
    /// reversal, pointing back at the originating entry.
    pub source_contribution_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ContributionEntry {
    pub(crate) fn new(goal_id: Uuid, amount: Money, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            amount,
            date,
            reason: None,
            source_contribution_id: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub(crate) fn with_source(mut self, source: Uuid) -> Self {
        self.source_contribution_id = Some(source);
        self
    }

    /// Returns `true` for deposits.
    #[must_use]
    pub fn is_deposit(&self) -> bool {
        self.amount.is_positive()
    }
}

impl fmt::Display for ContributionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} goal={}", self.date.date_naive(), self.amount, self.goal_id)
    }
}
