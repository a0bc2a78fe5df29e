//! Wire shapes shared between the engine's host transport and its clients.
//!
//! These mirror the engine's public operations 1:1 (`POST /goals`,
//! `POST /goals/:id/contribute`, `POST /goals/:id/withdraw`,
//! `GET /planning/goal/:id/calculate`, `POST /planning/goal/:id/save`) but
//! carry no behavior; amounts travel as integer minor units plus a currency
//! code.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
}

/// An amount in integer minor units of a currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub minor: i64,
    pub currency: Currency,
}

pub mod goal {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DistributionStrategy {
        Proportional,
        Sequential,
        #[default]
        None,
    }

    /// Request body for `POST /goals`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalNew {
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub target_amount: Amount,
        pub target_date: Option<NaiveDate>,
        /// Fixed at creation; goals cannot be re-parented later.
        pub parent_id: Option<Uuid>,
        pub distribution_strategy: Option<DistributionStrategy>,
        pub priority: Option<i32>,
    }

    /// Partial update of goal metadata.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub name: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub target_date: Option<Option<NaiveDate>>,
        pub priority: Option<Option<i32>>,
        pub distribution_strategy: Option<DistributionStrategy>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: Uuid,
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub target_amount: Amount,
        /// Derived from the ledger; never writable.
        pub current_amount: Amount,
        pub target_date: Option<NaiveDate>,
        pub parent_id: Option<Uuid>,
        pub distribution_strategy: DistributionStrategy,
        pub priority: Option<i32>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod contribution {
    use super::*;

    /// Request body for `POST /goals/:id/contribute`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionNew {
        pub amount: Amount,
        pub date: DateTime<Utc>,
        pub reason: Option<String>,
    }

    /// Request body for `POST /goals/:id/withdraw`.
    ///
    /// `reason` is mandatory when the goal is protected (emergency fund).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalNew {
        pub amount: Amount,
        pub date: DateTime<Utc>,
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionView {
        pub id: Uuid,
        pub goal_id: Uuid,
        /// Signed: positive = deposit, negative = withdrawal.
        pub amount: Amount,
        pub date: DateTime<Utc>,
        pub reason: Option<String>,
        /// Present on entries generated by fan-out or reversal.
        pub source_contribution_id: Option<Uuid>,
    }

    /// Response body for contribute/withdraw: the affected goal plus the
    /// entries written in the same batch.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContributionOutcome {
        pub goal: goal::GoalView,
        pub entries: Vec<ContributionView>,
    }
}

pub mod planning {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum ActionKind {
        Cut,
        Save,
        Earn,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActionPlanItemView {
        pub kind: ActionKind,
        pub description: String,
        pub value: Amount,
    }

    /// Query parameters for `GET /planning/goal/:id/calculate`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanRequest {
        /// Average monthly disposable cash flow, supplied by analytics.
        pub disposable_cash_flow: Amount,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanView {
        pub goal_id: Uuid,
        pub monthly_deposit: Amount,
        pub horizon_months: u32,
        pub is_viable: bool,
        /// True when no target date was set and the default horizon applied.
        pub default_horizon: bool,
        pub action_plan: Vec<ActionPlanItemView>,
        pub generated_at: DateTime<Utc>,
    }

    /// Response body for `POST /planning/goal/:id/save`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalPlanView {
        pub id: Uuid,
        pub goal_id: Uuid,
        pub monthly_deposit: Amount,
        pub horizon_months: u32,
        pub is_viable: bool,
        pub active: bool,
        pub accepted_at: DateTime<Utc>,
    }
}

pub mod emergency {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum FundStatus {
        Secure,
        Warning,
        Critical,
    }

    /// Request body for creating the (per-user singleton) emergency fund.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EmergencyFundInit {
        pub monthly_expenses: Amount,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EmergencyFundView {
        pub goal: goal::GoalView,
        pub monthly_expenses: Amount,
        pub status: FundStatus,
        /// Months of expenses covered, in tenths (8 = 0.8 months).
        pub months_covered_tenths: i64,
    }
}
