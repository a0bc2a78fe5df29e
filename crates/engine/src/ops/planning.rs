use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    GoalPlan, Money, Plan, ResultEngine,
    planner::compute_plan,
};

use super::Engine;

impl Engine {
    /// Computes the required monthly deposit and viability verdict for a
    /// goal.
    ///
    /// `disposable_cash_flow` is the user's average monthly income minus
    /// expenses, supplied by an external analytics collaborator. The result
    /// is ephemeral; nothing is persisted until [`Engine::accept_plan`].
    pub fn calculate_plan(
        &self,
        user_id: &str,
        goal_id: Uuid,
        disposable_cash_flow: Money,
        today: NaiveDate,
    ) -> ResultEngine<Plan> {
        let goal = self.require_goal(user_id, goal_id)?;
        compute_plan(
            &goal,
            disposable_cash_flow,
            today,
            self.default_horizon_months,
        )
    }

    /// Persists an accepted plan against its goal.
    ///
    /// A goal keeps at most one *active* plan: accepting a different plan
    /// supersedes the previous one (kept for history), while re-accepting a
    /// plan identical to the current active one is idempotent and returns it
    /// unchanged.
    pub fn accept_plan(&self, user_id: &str, plan: &Plan) -> ResultEngine<GoalPlan> {
        let goal = self.require_goal(user_id, plan.goal_id)?;
        let _guard = self.lock_tree(&goal)?;

        if let Some(active) = self.store.active_plan(plan.goal_id)?
            && active.matches(plan)
        {
            return Ok(active);
        }

        let accepted = GoalPlan::from_plan(plan, Utc::now());
        self.store.insert_plan(accepted.clone())?;
        tracing::info!(
            goal_id = %plan.goal_id,
            user_id = %user_id,
            plan_id = %accepted.id,
            "plan accepted"
        );
        Ok(accepted)
    }

    /// The goal's active accepted plan, if any.
    pub fn active_plan(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Option<GoalPlan>> {
        self.require_goal(user_id, goal_id)?;
        self.store.active_plan(goal_id)
    }

    /// Full plan history for a goal, newest last.
    pub fn plan_history(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Vec<GoalPlan>> {
        self.require_goal(user_id, goal_id)?;
        self.store.plans_for_goal(goal_id)
    }
}
