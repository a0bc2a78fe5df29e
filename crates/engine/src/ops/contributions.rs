use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    ContributionEntry, DistributionStrategy, EngineError, Goal, Money, ResultEngine,
    distribution::plan_fan_out,
};

use super::{Engine, normalize_optional_text};

impl Engine {
    /// Deposits `amount` on a goal.
    ///
    /// When the goal has children and a non-`None` distribution strategy the
    /// deposit fans out to them: the parent-level entry records whatever the
    /// children could not absorb and every generated child entry points back
    /// at it via `source_contribution_id`. The whole batch is appended
    /// atomically under the tree lock — a partial fan-out cannot be observed.
    ///
    /// Returns the goal with its balance recomputed from the ledger.
    pub fn deposit(
        &self,
        user_id: &str,
        goal_id: Uuid,
        amount: Money,
        date: DateTime<Utc>,
        reason: Option<&str>,
    ) -> ResultEngine<Goal> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "deposit amount must be > 0".to_string(),
            ));
        }
        let goal = self.require_goal(user_id, goal_id)?;
        ensure_goal_currency(&goal, amount)?;

        let _guard = self.lock_tree(&goal)?;

        // Fresh snapshot under the lock; fan-out math must see the children's
        // balances as of the start of this operation.
        let goal = self.require_goal(user_id, goal_id)?;
        let children = match goal.distribution_strategy {
            DistributionStrategy::None => Vec::new(),
            _ => self.store.children_of(goal_id)?,
        };

        let parent_entry = ContributionEntry::new(goal_id, amount, date)
            .with_reason(normalize_optional_text(reason));

        let mut batch = Vec::with_capacity(1);
        if children.is_empty() {
            batch.push(parent_entry);
        } else {
            let plan = plan_fan_out(goal.distribution_strategy, amount, &children)?;
            let mut parent_entry = parent_entry;
            parent_entry.amount = plan.retained;
            let parent_id = parent_entry.id;
            batch.push(parent_entry);
            for allocation in plan.allocations {
                batch.push(
                    ContributionEntry::new(allocation.goal_id, allocation.amount, date)
                        .with_source(parent_id),
                );
            }
        }

        self.store.append_entries(&batch)?;
        tracing::info!(
            goal_id = %goal_id,
            user_id = %user_id,
            amount = %amount,
            fan_out = batch.len() - 1,
            "deposit recorded"
        );
        self.require_goal(user_id, goal_id)
    }

    /// Withdraws `amount` from a goal.
    ///
    /// Withdrawals never cascade to children. By default the balance may not
    /// go negative ([`EngineError::InsufficientFunds`]); protected goals
    /// (emergency fund) additionally require a `reason`.
    pub fn withdraw(
        &self,
        user_id: &str,
        goal_id: Uuid,
        amount: Money,
        date: DateTime<Utc>,
        reason: Option<&str>,
    ) -> ResultEngine<Goal> {
        if !amount.is_positive() {
            return Err(EngineError::Validation(
                "withdrawal amount must be > 0".to_string(),
            ));
        }
        let goal = self.require_goal(user_id, goal_id)?;
        ensure_goal_currency(&goal, amount)?;

        let reason = normalize_optional_text(reason);
        if goal.is_protected() && reason.is_none() {
            return Err(EngineError::Validation(
                "withdrawal from a protected goal requires a reason".to_string(),
            ));
        }

        let _guard = self.lock_tree(&goal)?;

        let goal = self.require_goal(user_id, goal_id)?;
        if !goal.allow_negative {
            let after = goal.current_amount.checked_sub(amount)?;
            if after.is_negative() {
                return Err(EngineError::InsufficientFunds(format!(
                    "goal '{}' holds {}, requested {}",
                    goal.name, goal.current_amount, amount
                )));
            }
        }

        let entry = ContributionEntry::new(goal_id, amount.negated(), date).with_reason(reason);
        self.store.append_entries(std::slice::from_ref(&entry))?;
        tracing::info!(
            goal_id = %goal_id,
            user_id = %user_id,
            amount = %amount,
            "withdrawal recorded"
        );
        self.require_goal(user_id, goal_id)
    }

    /// Entries of a goal in insertion order.
    pub fn entries(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Vec<ContributionEntry>> {
        self.require_goal(user_id, goal_id)?;
        self.store.entries_for_goal(goal_id)
    }

    /// Current balance of a goal.
    pub fn balance_of(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Money> {
        self.require_goal(user_id, goal_id)?;
        self.store.balance_of(goal_id)
    }

    /// Reverses a contribution by inserting compensating entries.
    ///
    /// History is never mutated: the original entry stays, a new entry with
    /// the negated amount and `source_contribution_id` pointing at it is
    /// appended. Reversing a fan-out origin also compensates all entries it
    /// generated, in the same atomic batch. Reversal is an accounting
    /// correction and may push a balance negative.
    pub fn reverse_contribution(
        &self,
        user_id: &str,
        entry_id: Uuid,
        date: DateTime<Utc>,
    ) -> ResultEngine<Vec<ContributionEntry>> {
        let original = self.store.entry(entry_id)?;
        let goal = self.require_goal(user_id, original.goal_id)?;
        let _guard = self.lock_tree(&goal)?;

        let linked = self.store.entries_with_source(entry_id)?;
        let already_reversed = linked
            .iter()
            .any(|e| e.goal_id == original.goal_id && e.amount == original.amount.negated());
        if already_reversed {
            return Err(EngineError::Validation(format!(
                "entry {entry_id} is already reversed"
            )));
        }

        let mut batch = vec![
            ContributionEntry::new(original.goal_id, original.amount.negated(), date)
                .with_source(original.id)
                .with_reason(Some("reversal".to_string())),
        ];
        // Fan-out entries generated by this one live on other goals.
        for generated in linked.iter().filter(|e| e.goal_id != original.goal_id) {
            batch.push(
                ContributionEntry::new(generated.goal_id, generated.amount.negated(), date)
                    .with_source(generated.id)
                    .with_reason(Some("reversal".to_string())),
            );
        }

        self.store.append_entries(&batch)?;
        tracing::info!(
            entry_id = %entry_id,
            user_id = %user_id,
            compensated = batch.len(),
            "contribution reversed"
        );
        Ok(batch)
    }

    /// Recomputes a goal's balance by replaying its entry log.
    ///
    /// The running balance kept by the store must already equal the replayed
    /// sum; this operation re-derives it (e.g. after restoring a store from
    /// backup) and writes it back.
    pub fn recompute_balance(&self, user_id: &str, goal_id: Uuid) -> ResultEngine<Goal> {
        let goal = self.require_goal(user_id, goal_id)?;
        let _guard = self.lock_tree(&goal)?;

        let mut goal = self.require_goal(user_id, goal_id)?;
        let mut balance = Money::zero(goal.target_amount.currency());
        for entry in self.store.entries_for_goal(goal_id)? {
            balance = balance.checked_add(entry.amount)?;
        }
        goal.current_amount = balance;
        self.store.update_goal(&goal)?;
        Ok(goal)
    }
}

fn ensure_goal_currency(goal: &Goal, amount: Money) -> ResultEngine<()> {
    if goal.target_amount.currency() != amount.currency() {
        return Err(EngineError::CurrencyMismatch(format!(
            "goal currency is {}, got {}",
            goal.target_amount.currency().code(),
            amount.currency().code()
        )));
    }
    Ok(())
}
