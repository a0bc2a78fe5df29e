//! Persistence seam for goals, ledger entries and accepted plans.
//!
//! The engine defines the stored shapes and the contract; the storage
//! technology lives behind [`GoalStore`]. The in-crate [`MemoryStore`] is the
//! reference implementation and the test backend; durable stores are external
//! collaborators implementing the same trait.
//!
//! Contract highlights:
//! - `entries_for_goal` returns entries in insertion order.
//! - `append_entries` is all-or-nothing: a fan-out batch is either fully
//!   written or not at all. A partial fan-out is data corruption, not a
//!   recoverable state.
//! - `balance_of` is O(1): the store maintains a running balance per goal,
//!   invalidated only by appends.
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use uuid::Uuid;

use crate::{ContributionEntry, EngineError, Goal, GoalPlan, Money, PlanStatus, ResultEngine};

/// Storage collaborator for the engine.
pub trait GoalStore: Send + Sync + std::fmt::Debug {
    fn insert_goal(&self, goal: Goal) -> ResultEngine<()>;

    /// Replaces the stored goal. Callers hold the subtree lock, read the
    /// current goal, modify it and write it back.
    fn update_goal(&self, goal: &Goal) -> ResultEngine<()>;

    /// Removes a goal. Its entry log is kept (archived balance history).
    fn remove_goal(&self, goal_id: Uuid) -> ResultEngine<()>;

    /// Returns the goal with its cached `current_amount` filled in.
    fn goal(&self, goal_id: Uuid) -> ResultEngine<Goal>;

    /// All goals of a user, in creation order.
    fn goals_for_user(&self, user_id: &str) -> ResultEngine<Vec<Goal>>;

    /// Direct children of a goal, in creation order.
    fn children_of(&self, parent_id: Uuid) -> ResultEngine<Vec<Goal>>;

    /// Appends a batch of entries atomically and updates the running
    /// balances. Every entry must reference an existing goal of matching
    /// currency; on any validation failure nothing is written.
    fn append_entries(&self, entries: &[ContributionEntry]) -> ResultEngine<()>;

    /// Entries of a goal in insertion order.
    fn entries_for_goal(&self, goal_id: Uuid) -> ResultEngine<Vec<ContributionEntry>>;

    fn entry(&self, entry_id: Uuid) -> ResultEngine<ContributionEntry>;

    /// Entries whose `source_contribution_id` points at the given entry.
    fn entries_with_source(&self, source_id: Uuid) -> ResultEngine<Vec<ContributionEntry>>;

    /// Running balance of a goal.
    fn balance_of(&self, goal_id: Uuid) -> ResultEngine<Money>;

    /// Stores an accepted plan, superseding the goal's previous active plan.
    fn insert_plan(&self, plan: GoalPlan) -> ResultEngine<()>;

    /// The goal's single active plan, if any.
    fn active_plan(&self, goal_id: Uuid) -> ResultEngine<Option<GoalPlan>>;

    /// Full plan history for a goal, newest last.
    fn plans_for_goal(&self, goal_id: Uuid) -> ResultEngine<Vec<GoalPlan>>;
}

#[derive(Debug, Default)]
struct StoreState {
    goals: HashMap<Uuid, Goal>,
    entries: Vec<ContributionEntry>,
    plans: Vec<GoalPlan>,
}

/// In-memory [`GoalStore`].
///
/// Balances live on the stored goals themselves (`current_amount` is the
/// running balance) and are the source of truth between appends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // Poisoning only matters if a panic happened mid-mutation; state
        // mutations below are single assignments, so continue with the inner
        // value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GoalStore for MemoryStore {
    fn insert_goal(&self, goal: Goal) -> ResultEngine<()> {
        let mut state = self.state();
        if state.goals.contains_key(&goal.id) {
            return Err(EngineError::Validation(format!(
                "goal {} already exists",
                goal.id
            )));
        }
        state.goals.insert(goal.id, goal);
        Ok(())
    }

    fn update_goal(&self, goal: &Goal) -> ResultEngine<()> {
        let mut state = self.state();
        if !state.goals.contains_key(&goal.id) {
            return Err(EngineError::NotFound(goal.id.to_string()));
        }
        state.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    fn remove_goal(&self, goal_id: Uuid) -> ResultEngine<()> {
        let mut state = self.state();
        state
            .goals
            .remove(&goal_id)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(goal_id.to_string()))
    }

    fn goal(&self, goal_id: Uuid) -> ResultEngine<Goal> {
        let state = self.state();
        state
            .goals
            .get(&goal_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(goal_id.to_string()))
    }

    fn goals_for_user(&self, user_id: &str) -> ResultEngine<Vec<Goal>> {
        let state = self.state();
        let mut goals: Vec<Goal> = state
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        goals.sort_by_key(|g| g.created_at);
        Ok(goals)
    }

    fn children_of(&self, parent_id: Uuid) -> ResultEngine<Vec<Goal>> {
        let state = self.state();
        let mut children: Vec<Goal> = state
            .goals
            .values()
            .filter(|g| g.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by_key(|g| g.created_at);
        Ok(children)
    }

    fn append_entries(&self, entries: &[ContributionEntry]) -> ResultEngine<()> {
        let mut state = self.state();

        // Validate the whole batch before touching anything.
        let mut new_balances: HashMap<Uuid, Money> = HashMap::new();
        for entry in entries {
            let goal = state
                .goals
                .get(&entry.goal_id)
                .ok_or_else(|| EngineError::NotFound(entry.goal_id.to_string()))?;
            let balance = new_balances
                .get(&entry.goal_id)
                .copied()
                .unwrap_or(goal.current_amount);
            let updated = balance.checked_add(entry.amount)?;
            new_balances.insert(entry.goal_id, updated);
        }

        state.entries.extend(entries.iter().cloned());
        for (goal_id, balance) in new_balances {
            if let Some(goal) = state.goals.get_mut(&goal_id) {
                goal.current_amount = balance;
            }
        }
        Ok(())
    }

    fn entries_for_goal(&self, goal_id: Uuid) -> ResultEngine<Vec<ContributionEntry>> {
        let state = self.state();
        Ok(state
            .entries
            .iter()
            .filter(|e| e.goal_id == goal_id)
            .cloned()
            .collect())
    }

    fn entry(&self, entry_id: Uuid) -> ResultEngine<ContributionEntry> {
        let state = self.state();
        state
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(entry_id.to_string()))
    }

    fn entries_with_source(&self, source_id: Uuid) -> ResultEngine<Vec<ContributionEntry>> {
        let state = self.state();
        Ok(state
            .entries
            .iter()
            .filter(|e| e.source_contribution_id == Some(source_id))
            .cloned()
            .collect())
    }

    fn balance_of(&self, goal_id: Uuid) -> ResultEngine<Money> {
        let state = self.state();
        state
            .goals
            .get(&goal_id)
            .map(|g| g.current_amount)
            .ok_or_else(|| EngineError::NotFound(goal_id.to_string()))
    }

    fn insert_plan(&self, plan: GoalPlan) -> ResultEngine<()> {
        let mut state = self.state();
        for existing in state
            .plans
            .iter_mut()
            .filter(|p| p.goal_id == plan.goal_id && p.status == PlanStatus::Active)
        {
            existing.status = PlanStatus::Superseded;
        }
        state.plans.push(plan);
        Ok(())
    }

    fn active_plan(&self, goal_id: Uuid) -> ResultEngine<Option<GoalPlan>> {
        let state = self.state();
        Ok(state
            .plans
            .iter()
            .find(|p| p.goal_id == goal_id && p.status == PlanStatus::Active)
            .cloned())
    }

    fn plans_for_goal(&self, goal_id: Uuid) -> ResultEngine<Vec<GoalPlan>> {
        let state = self.state();
        Ok(state
            .plans
            .iter()
            .filter(|p| p.goal_id == goal_id)
            .cloned()
            .collect())
    }
}
