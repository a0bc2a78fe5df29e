use std::{collections::HashSet, time::Duration};

use uuid::Uuid;

use crate::{
    EngineError, Goal, GoalStore, MemoryStore, ResultEngine,
    lock::{SubtreeGuard, SubtreeLocks},
};

mod contributions;
mod emergency;
mod goals;
mod planning;

/// The goal-planning engine.
///
/// All operations take an explicit `user_id`; there is no ambient
/// current-user context. Mutations are serialized per goal tree (see
/// [`crate::lock`]), so concurrent deposits against the same parent never
/// interleave their fan-out math.
#[derive(Debug)]
pub struct Engine {
    store: Box<dyn GoalStore>,
    locks: SubtreeLocks,
    default_horizon_months: u32,
    lock_wait: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Loads a goal and checks it belongs to the user.
    ///
    /// Goals of other users are reported as [`EngineError::NotFound`], never
    /// as a permission error, so ids cannot be probed.
    fn require_goal(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Goal> {
        let goal = self.store.goal(goal_id)?;
        if goal.user_id != user_id {
            return Err(EngineError::NotFound(goal_id.to_string()));
        }
        Ok(goal)
    }

    /// Walks parent links up to the root of the goal's tree.
    ///
    /// Parent links are immutable after creation, so the root is stable and
    /// can be resolved before taking the subtree lock. The visited guard only
    /// fires if a store hands back a corrupted forest.
    fn tree_root(&self, goal: &Goal) -> ResultEngine<Uuid> {
        let mut current = goal.clone();
        let mut visited = HashSet::from([current.id]);
        while let Some(parent_id) = current.parent_id {
            if !visited.insert(parent_id) {
                return Err(EngineError::Validation(format!(
                    "cycle detected in goal tree at {parent_id}"
                )));
            }
            current = self.store.goal(parent_id)?;
        }
        Ok(current.id)
    }

    /// Takes the exclusive mutation lock for the tree containing `goal`.
    fn lock_tree(&self, goal: &Goal) -> ResultEngine<SubtreeGuard<'_>> {
        let root = self.tree_root(goal)?;
        self.locks.acquire(root, self.lock_wait)
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    store: Option<Box<dyn GoalStore>>,
    default_horizon_months: u32,
    lock_wait: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            store: None,
            default_horizon_months: 12,
            lock_wait: Duration::from_secs(2),
        }
    }
}

impl EngineBuilder {
    /// Pass the storage backend (defaults to [`MemoryStore`]).
    pub fn store(mut self, store: impl GoalStore + 'static) -> EngineBuilder {
        self.store = Some(Box::new(store));
        self
    }

    /// Planning horizon applied to goals without a target date.
    pub fn default_horizon_months(mut self, months: u32) -> EngineBuilder {
        self.default_horizon_months = months;
        self
    }

    /// Bounded wait for the per-tree mutation lock.
    pub fn lock_wait(mut self, wait: Duration) -> EngineBuilder {
        self.lock_wait = wait;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        if self.default_horizon_months == 0 {
            return Err(EngineError::Validation(
                "default horizon must be at least one month".to_string(),
            ));
        }
        Ok(Engine {
            store: self
                .store
                .unwrap_or_else(|| Box::new(MemoryStore::new())),
            locks: SubtreeLocks::default(),
            default_horizon_months: self.default_horizon_months,
            lock_wait: self.lock_wait,
        })
    }
}
