//! The module contains the representation of a savings goal.
//!
//! Goals form a forest: a goal may nest under at most one parent ("House" →
//! "Down Payment") and the parent is fixed at creation time, so cycles are
//! structurally impossible. A parent's balance is **independent** of its
//! children's balances: each goal is its own pot, never a roll-up.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// Policy governing how a deposit to a parent goal is shared among its
/// children. Meaningful only on goals that have children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStrategy {
    /// Children receive shares proportional to their target amounts.
    Proportional,
    /// Children are filled one by one in priority order.
    Sequential,
    /// The deposit stays entirely on the parent.
    #[default]
    None,
}

impl DistributionStrategy {
    /// Returns the canonical strategy string used by clients.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proportional => "proportional",
            Self::Sequential => "sequential",
            Self::None => "none",
        }
    }
}

impl TryFrom<&str> for DistributionStrategy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "proportional" => Ok(Self::Proportional),
            "sequential" => Ok(Self::Sequential),
            "none" => Ok(Self::None),
            other => Err(EngineError::Validation(format!(
                "unknown distribution strategy: {other}"
            ))),
        }
    }
}

/// Kind of goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    #[default]
    Standard,
    /// Protected singleton per user; target derived from monthly expenses.
    EmergencyFund,
}

/// A savings goal.
///
/// `current_amount` is derived from the contribution ledger and is never set
/// directly; the engine recomputes it from the entry log and caches it in the
/// store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub target_amount: Money,
    pub current_amount: Money,
    pub target_date: Option<NaiveDate>,
    pub parent_id: Option<Uuid>,
    pub distribution_strategy: DistributionStrategy,
    /// Explicit ordering for sequential fan-out; lower fills first.
    /// Children without a priority fall back to creation order.
    pub priority: Option<i32>,
    pub kind: GoalKind,
    /// Average monthly expenses backing an emergency fund's derived target.
    /// Always `Some` for [`GoalKind::EmergencyFund`], `None` otherwise.
    pub monthly_expenses: Option<Money>,
    /// If true, withdrawals may push the balance below zero.
    pub allow_negative: bool,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub(crate) fn from_spec(spec: GoalSpec, created_at: DateTime<Utc>) -> Self {
        let currency = spec.target_amount.currency();
        Self {
            id: Uuid::new_v4(),
            user_id: spec.user_id,
            name: spec.name,
            icon: spec.icon,
            color: spec.color,
            target_amount: spec.target_amount,
            current_amount: Money::zero(currency),
            target_date: spec.target_date,
            parent_id: spec.parent_id,
            distribution_strategy: spec.distribution_strategy,
            priority: spec.priority,
            kind: GoalKind::Standard,
            monthly_expenses: None,
            allow_negative: spec.allow_negative,
            created_at,
        }
    }

    /// Returns `true` when withdrawals require an explicit reason.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        matches!(self.kind, GoalKind::EmergencyFund)
    }

    /// Remaining capacity before the goal reaches its target (never negative).
    pub fn remaining_capacity(&self) -> ResultEngine<Money> {
        let remaining = self.target_amount.checked_sub(self.current_amount)?;
        if remaining.is_negative() {
            return Ok(Money::zero(self.target_amount.currency()));
        }
        Ok(remaining)
    }
}

/// Parameters for creating a goal.
///
/// Groups arguments for [`Engine::create_goal`], keeping call sites readable
/// and avoiding long argument lists.
///
/// [`Engine::create_goal`]: crate::Engine::create_goal
#[derive(Clone, Debug)]
pub struct GoalSpec {
    pub user_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub target_amount: Money,
    pub target_date: Option<NaiveDate>,
    pub parent_id: Option<Uuid>,
    pub distribution_strategy: DistributionStrategy,
    pub priority: Option<i32>,
    pub allow_negative: bool,
}

impl GoalSpec {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, target_amount: Money) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            icon: None,
            color: None,
            target_amount,
            target_date: None,
            parent_id: None,
            distribution_strategy: DistributionStrategy::None,
            priority: None,
            allow_negative: false,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    #[must_use]
    pub fn parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: DistributionStrategy) -> Self {
        self.distribution_strategy = strategy;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn allow_negative(mut self) -> Self {
        self.allow_negative = true;
        self
    }
}

/// Metadata fields that may change after creation.
///
/// `parent_id` is deliberately absent: re-parenting is rejected outright so
/// distribution history never needs retroactive recomputation.
#[derive(Clone, Debug, Default)]
pub struct GoalMetaUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub target_date: Option<Option<NaiveDate>>,
    pub priority: Option<Option<i32>>,
    pub distribution_strategy: Option<DistributionStrategy>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::Currency;

    #[test]
    fn strategy_round_trips_through_strings() {
        for strategy in [
            DistributionStrategy::Proportional,
            DistributionStrategy::Sequential,
            DistributionStrategy::None,
        ] {
            assert_eq!(
                DistributionStrategy::try_from(strategy.as_str()).unwrap(),
                strategy
            );
        }
        assert!(DistributionStrategy::try_from("round-robin").is_err());
    }

    #[test]
    fn goal_serializes_with_snake_case_strategy() {
        let goal = Goal::from_spec(
            GoalSpec::new("alice", "House", Money::new(500_000, Currency::Eur))
                .strategy(DistributionStrategy::Proportional),
            Utc::now(),
        );
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["distribution_strategy"], "proportional");
        assert_eq!(json["kind"], "standard");
        assert_eq!(json["target_amount"]["currency"], "EUR");
    }

    #[test]
    fn remaining_capacity_never_goes_negative() {
        let mut goal = Goal::from_spec(
            GoalSpec::new("alice", "Trip", Money::new(1000, Currency::Eur)),
            Utc::now(),
        );
        goal.current_amount = Money::new(1500, Currency::Eur);
        assert!(goal.remaining_capacity().unwrap().is_zero());
    }
}
