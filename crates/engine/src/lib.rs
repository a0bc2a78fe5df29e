//! Goal-based savings planning engine.
//!
//! The crate models hierarchical savings goals, an append-only contribution
//! ledger, deposit fan-out over child goals, deadline viability planning and
//! a specialized emergency fund. It is synchronous, transport-agnostic domain
//! logic: HTTP, persistence technology and cash-flow analytics are external
//! collaborators (see [`GoalStore`] and [`RateProvider`]).
pub use currency::{Currency, RateProvider};
pub use distribution::{ChildAllocation, FanOutPlan, plan_fan_out};
pub use emergency::{EMERGENCY_FUND_TARGET_MONTHS, EmergencyFundSnapshot, FundStatus};
pub use error::EngineError;
pub use goals::{DistributionStrategy, Goal, GoalKind, GoalMetaUpdate, GoalSpec};
pub use ledger::ContributionEntry;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use planner::{ActionKind, ActionPlanItem, GoalPlan, Plan, PlanStatus};
pub use store::{GoalStore, MemoryStore};

mod currency;
mod distribution;
mod emergency;
mod error;
mod goals;
mod ledger;
mod lock;
mod money;
mod ops;
mod planner;
mod store;

pub type ResultEngine<T> = Result<T, EngineError>;
