use chrono::Utc;

use crate::{
    EmergencyFundSnapshot, EngineError, Goal, GoalKind, GoalSpec, Money, ResultEngine,
    emergency::derived_target,
};

use super::Engine;

impl Engine {
    /// Creates the user's emergency fund.
    ///
    /// Singleton per user, flat (never a parent or a child), protected
    /// (withdrawals require a reason). The target amount is derived as six
    /// months of average expenses and is never user-set.
    pub fn init_emergency_fund(
        &self,
        user_id: &str,
        monthly_expenses: Money,
    ) -> ResultEngine<EmergencyFundSnapshot> {
        if !monthly_expenses.is_positive() {
            return Err(EngineError::Validation(
                "monthly expenses must be > 0".to_string(),
            ));
        }
        if self.find_emergency_goal(user_id)?.is_some() {
            return Err(EngineError::Validation(format!(
                "user {user_id} already has an emergency fund"
            )));
        }

        let target = derived_target(monthly_expenses)?;
        let mut goal = Goal::from_spec(
            GoalSpec::new(user_id, "Emergency Fund", target),
            Utc::now(),
        );
        goal.kind = GoalKind::EmergencyFund;
        goal.monthly_expenses = Some(monthly_expenses);

        self.store.insert_goal(goal.clone())?;
        tracing::info!(goal_id = %goal.id, user_id = %user_id, "emergency fund created");
        EmergencyFundSnapshot::build(goal)
    }

    /// Current health of the user's emergency fund.
    ///
    /// The status is derived from the live balance on every call, so it can
    /// never lag behind a deposit or withdrawal that already committed.
    pub fn emergency_fund(&self, user_id: &str) -> ResultEngine<EmergencyFundSnapshot> {
        let goal = self
            .find_emergency_goal(user_id)?
            .ok_or_else(|| EngineError::NotFound("emergency fund".to_string()))?;
        EmergencyFundSnapshot::build(goal)
    }

    /// Updates the average monthly expenses and re-derives the fund target.
    pub fn set_monthly_expenses(
        &self,
        user_id: &str,
        monthly_expenses: Money,
    ) -> ResultEngine<EmergencyFundSnapshot> {
        if !monthly_expenses.is_positive() {
            return Err(EngineError::Validation(
                "monthly expenses must be > 0".to_string(),
            ));
        }
        let goal = self
            .find_emergency_goal(user_id)?
            .ok_or_else(|| EngineError::NotFound("emergency fund".to_string()))?;
        if goal.target_amount.currency() != monthly_expenses.currency() {
            return Err(EngineError::CurrencyMismatch(format!(
                "fund currency is {}, got {}",
                goal.target_amount.currency().code(),
                monthly_expenses.currency().code()
            )));
        }

        let _guard = self.lock_tree(&goal)?;

        let mut goal = self.require_goal(user_id, goal.id)?;
        goal.monthly_expenses = Some(monthly_expenses);
        goal.target_amount = derived_target(monthly_expenses)?;
        self.store.update_goal(&goal)?;
        EmergencyFundSnapshot::build(goal)
    }

    fn find_emergency_goal(&self, user_id: &str) -> ResultEngine<Option<Goal>> {
        Ok(self
            .store
            .goals_for_user(user_id)?
            .into_iter()
            .find(|g| g.kind == GoalKind::EmergencyFund))
    }
}
