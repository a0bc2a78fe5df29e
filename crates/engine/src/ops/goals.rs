use chrono::Utc;
use uuid::Uuid;

use crate::{
    EngineError, Goal, GoalKind, GoalMetaUpdate, GoalSpec, ResultEngine,
};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Creates a new goal with a zero balance.
    ///
    /// The parent, when given, is fixed forever: re-parenting is not exposed,
    /// which is what keeps the forest acyclic and distribution history
    /// stable.
    pub fn create_goal(&self, spec: GoalSpec) -> ResultEngine<Goal> {
        let mut spec = spec;
        spec.name = normalize_required_name(&spec.name, "goal")?;
        if !spec.target_amount.is_positive() {
            return Err(EngineError::Validation(
                "target amount must be > 0".to_string(),
            ));
        }

        // Validate the parent and hold its tree lock while attaching, so a
        // concurrent fan-out observes either no child or a fully created one.
        let _guard = match spec.parent_id {
            Some(parent_id) => {
                let parent = self.require_goal(&spec.user_id, parent_id)?;
                if parent.kind == GoalKind::EmergencyFund {
                    return Err(EngineError::Validation(
                        "an emergency fund cannot have child goals".to_string(),
                    ));
                }
                if parent.target_amount.currency() != spec.target_amount.currency() {
                    return Err(EngineError::CurrencyMismatch(format!(
                        "parent currency is {}, got {}",
                        parent.target_amount.currency().code(),
                        spec.target_amount.currency().code()
                    )));
                }
                Some(self.lock_tree(&parent)?)
            }
            None => None,
        };

        let goal = Goal::from_spec(spec, Utc::now());
        self.store.insert_goal(goal.clone())?;
        tracing::info!(goal_id = %goal.id, user_id = %goal.user_id, "goal created");
        Ok(goal)
    }

    /// Deletes a goal.
    ///
    /// Fails with [`EngineError::HasChildren`] while children exist; the
    /// caller must delete them first. A non-zero balance does not block
    /// deletion, the entry log stays behind as archived history.
    pub fn delete_goal(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<()> {
        let goal = self.require_goal(user_id, goal_id)?;
        let _guard = self.lock_tree(&goal)?;

        if !self.store.children_of(goal_id)?.is_empty() {
            return Err(EngineError::HasChildren(goal.name));
        }
        self.store.remove_goal(goal_id)?;
        tracing::info!(goal_id = %goal_id, user_id = %user_id, "goal deleted");
        Ok(())
    }

    /// Updates display metadata and planning fields of a goal.
    ///
    /// `parent_id`, `target_amount` and the goal kind are not updatable here;
    /// balances only ever change through the ledger.
    pub fn update_goal_meta(
        &self,
        user_id: &str,
        goal_id: Uuid,
        update: GoalMetaUpdate,
    ) -> ResultEngine<Goal> {
        let goal = self.require_goal(user_id, goal_id)?;
        let _guard = self.lock_tree(&goal)?;

        // Re-read under the lock; a deposit may have landed in between.
        let mut goal = self.require_goal(user_id, goal_id)?;
        if let Some(name) = update.name {
            goal.name = normalize_required_name(&name, "goal")?;
        }
        if let Some(icon) = update.icon {
            goal.icon = Some(icon);
        }
        if let Some(color) = update.color {
            goal.color = Some(color);
        }
        if let Some(target_date) = update.target_date {
            goal.target_date = target_date;
        }
        if let Some(priority) = update.priority {
            goal.priority = priority;
        }
        if let Some(strategy) = update.distribution_strategy {
            goal.distribution_strategy = strategy;
        }

        self.store.update_goal(&goal)?;
        Ok(goal)
    }

    /// Returns a goal with its current balance.
    pub fn goal(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Goal> {
        self.require_goal(user_id, goal_id)
    }

    /// All goals of a user, in creation order.
    pub fn list_goals(&self, user_id: &str) -> ResultEngine<Vec<Goal>> {
        self.store.goals_for_user(user_id)
    }

    /// Direct children of a goal, in creation order.
    pub fn list_children(&self, user_id: &str, parent_id: Uuid) -> ResultEngine<Vec<Goal>> {
        self.require_goal(user_id, parent_id)?;
        self.store.children_of(parent_id)
    }

    /// Ancestors of a goal, nearest parent first, root last. O(depth).
    pub fn ancestor_chain(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Vec<Goal>> {
        let mut current = self.require_goal(user_id, goal_id)?;
        let mut visited = std::collections::HashSet::from([current.id]);
        let mut chain = Vec::new();
        while let Some(parent_id) = current.parent_id {
            if !visited.insert(parent_id) {
                return Err(EngineError::Validation(format!(
                    "cycle detected in goal tree at {parent_id}"
                )));
            }
            current = self.store.goal(parent_id)?;
            chain.push(current.clone());
        }
        Ok(chain)
    }
}
