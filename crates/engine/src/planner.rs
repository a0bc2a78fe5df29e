//! Viability planning: is a goal's deadline affordable given the user's
//! disposable cash flow, and if not, what can be done about it.
//!
//! The disposable cash flow figure is supplied by an external analytics
//! collaborator; this module only consumes it.
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Goal, Money, ResultEngine};

/// Category of an advisory action-plan item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Cut,
    Save,
    Earn,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cut => "CUT",
            Self::Save => "SAVE",
            Self::Earn => "EARN",
        }
    }
}

/// Advisory suggestion attached to a non-viable plan. Text plus an estimated
/// value; never applied automatically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionPlanItem {
    pub kind: ActionKind,
    pub description: String,
    pub value: Money,
}

/// Output of a viability calculation. Ephemeral until accepted (see
/// [`GoalPlan`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub goal_id: Uuid,
    /// Required deposit for every month but the last; the final month absorbs
    /// the rounding remainder.
    pub monthly_deposit: Money,
    pub horizon_months: u32,
    pub is_viable: bool,
    /// True when the goal has no target date and the horizon fell back to the
    /// configured default.
    pub default_horizon: bool,
    pub action_plan: Vec<ActionPlanItem>,
    pub generated_at: DateTime<Utc>,
}

/// Lifecycle of an accepted plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    /// Replaced by a later accepted plan; kept for history, never deleted.
    Superseded,
}

/// A [`Plan`] the user explicitly accepted, persisted against the goal.
///
/// A goal has at most one `Active` plan; accepting a new one supersedes the
/// previous.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalPlan {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub monthly_deposit: Money,
    pub horizon_months: u32,
    pub is_viable: bool,
    pub action_plan: Vec<ActionPlanItem>,
    pub status: PlanStatus,
    pub accepted_at: DateTime<Utc>,
}

impl GoalPlan {
    pub(crate) fn from_plan(plan: &Plan, accepted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id: plan.goal_id,
            monthly_deposit: plan.monthly_deposit,
            horizon_months: plan.horizon_months,
            is_viable: plan.is_viable,
            action_plan: plan.action_plan.clone(),
            status: PlanStatus::Active,
            accepted_at,
        }
    }

    /// Whether accepting `plan` again would change anything.
    pub(crate) fn matches(&self, plan: &Plan) -> bool {
        self.goal_id == plan.goal_id
            && self.monthly_deposit == plan.monthly_deposit
            && self.horizon_months == plan.horizon_months
            && self.is_viable == plan.is_viable
    }
}

/// Whole months between `from` and `until`, rounded up, minimum 1.
pub(crate) fn months_until(from: NaiveDate, until: NaiveDate) -> u32 {
    if until <= from {
        return 1;
    }
    let mut months =
        (until.year() - from.year()) * 12 + (until.month() as i32 - from.month() as i32);
    if until.day() > from.day() {
        months += 1;
    }
    months.max(1) as u32
}

/// Computes the required monthly deposit and the viability verdict for a goal.
///
/// `default_horizon_months` is the policy fallback when the goal carries no
/// target date; in that case the plan is treated as viable by default.
pub(crate) fn compute_plan(
    goal: &Goal,
    disposable_cash_flow: Money,
    today: NaiveDate,
    default_horizon_months: u32,
) -> ResultEngine<Plan> {
    let currency = goal.target_amount.currency();
    if disposable_cash_flow.currency() != currency {
        return Err(EngineError::CurrencyMismatch(format!(
            "goal currency is {}, got {}",
            currency.code(),
            disposable_cash_flow.currency().code()
        )));
    }

    let remaining = goal.target_amount.checked_sub(goal.current_amount)?;
    if !remaining.is_positive() {
        // Already funded; nothing left to plan.
        return Ok(Plan {
            goal_id: goal.id,
            monthly_deposit: Money::zero(currency),
            horizon_months: 0,
            is_viable: true,
            default_horizon: false,
            action_plan: Vec::new(),
            generated_at: Utc::now(),
        });
    }

    let (months, default_horizon) = match goal.target_date {
        Some(date) => (months_until(today, date), false),
        None => (default_horizon_months.max(1), true),
    };

    let (monthly_deposit, _final_month) = remaining.split_even(months)?;
    let is_viable = default_horizon
        || monthly_deposit.compare(disposable_cash_flow)? != std::cmp::Ordering::Greater;

    let mut action_plan = Vec::new();
    if !is_viable {
        let shortfall = monthly_deposit.checked_sub(disposable_cash_flow)?;
        action_plan.push(ActionPlanItem {
            kind: ActionKind::Cut,
            description: format!(
                "Cut the top discretionary spending category by {shortfall} per month"
            ),
            value: shortfall,
        });

        if disposable_cash_flow.is_positive() {
            // Smallest month count where the monthly instalment fits the cash
            // flow.
            // Signed `div_ceil` is unstable (`int_roundings`); this is the
            // exact equivalent: round the quotient toward positive infinity.
            let (num, den) = (remaining.minor(), disposable_cash_flow.minor());
            let (quot, rem) = (num / den, num % den);
            let ceil = quot + i64::from(rem != 0 && (rem > 0) == (den > 0));
            let needed = u32::try_from(ceil.max(1)).unwrap_or(u32::MAX);
            let (extended_monthly, _) = remaining.split_even(needed)?;
            action_plan.push(ActionPlanItem {
                kind: ActionKind::Save,
                description: format!(
                    "Extend the deadline to {needed} months and save {extended_monthly} per month"
                ),
                value: extended_monthly,
            });
        } else {
            // No cash flow to stretch over a longer horizon; income has to
            // grow.
            action_plan.push(ActionPlanItem {
                kind: ActionKind::Earn,
                description: format!("Increase monthly income by {shortfall}"),
                value: shortfall,
            });
        }
    }

    Ok(Plan {
        goal_id: goal.id,
        monthly_deposit,
        horizon_months: months,
        is_viable,
        default_horizon,
        action_plan,
        generated_at: Utc::now(),
    })
}
