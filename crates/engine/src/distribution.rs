//! Fan-out planning: how a deposit on a parent goal is shared among its
//! children.
//!
//! The planning here is pure arithmetic over a snapshot of the children taken
//! under the subtree lock; the caller turns the resulting allocations into
//! ledger entries and appends them as one atomic batch.
use uuid::Uuid;

use crate::{Currency, DistributionStrategy, EngineError, Goal, Money, ResultEngine};

/// Result of planning a fan-out: what each child receives, and what stays on
/// the parent.
///
/// The invariant `retained + Σ allocations == deposit` holds for every plan.
#[derive(Clone, Debug)]
pub struct FanOutPlan {
    /// Amount the parent keeps (whatever children could not absorb).
    pub retained: Money,
    /// Positive amounts per child, in child order. Children receiving nothing
    /// are omitted.
    pub allocations: Vec<ChildAllocation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChildAllocation {
    pub goal_id: Uuid,
    pub amount: Money,
}

/// Plans how `deposit` fans out over `children` under `strategy`.
///
/// `children` must carry fresh balances (snapshot taken under the subtree
/// lock). Withdrawals never fan out, so `deposit` must be positive.
pub fn plan_fan_out(
    strategy: DistributionStrategy,
    deposit: Money,
    children: &[Goal],
) -> ResultEngine<FanOutPlan> {
    if !deposit.is_positive() {
        return Err(EngineError::Validation(
            "fan-out requires a positive deposit".to_string(),
        ));
    }

    match strategy {
        DistributionStrategy::None => Ok(FanOutPlan {
            retained: deposit,
            allocations: Vec::new(),
        }),
        DistributionStrategy::Proportional => plan_proportional(deposit, children),
        DistributionStrategy::Sequential => plan_sequential(deposit, children),
    }
}

/// Proportional: each under-target child receives a share weighted by its
/// **target amount** (not its remaining capacity), via the lossless weighted
/// split. A share exceeding a child's remaining capacity is capped there and
/// the excess is redistributed over the still-open children with recomputed
/// ratios; when no capacity remains the rest stays on the parent.
fn plan_proportional(deposit: Money, children: &[Goal]) -> ResultEngine<FanOutPlan> {
    let currency = deposit.currency();

    // (child index, remaining capacity in minor units)
    let mut open: Vec<(usize, i64)> = Vec::new();
    for (index, child) in children.iter().enumerate() {
        let capacity = child.remaining_capacity()?.minor();
        if capacity > 0 {
            open.push((index, capacity));
        }
    }

    let mut granted = vec![0i64; children.len()];
    let mut pool = deposit;

    while pool.is_positive() && !open.is_empty() {
        let weights: Vec<i64> = open
            .iter()
            .map(|(index, _)| children[*index].target_amount.minor())
            .collect();
        let shares = pool.split_weighted(&weights)?;

        let mut overflow = 0i64;
        let mut still_open = Vec::with_capacity(open.len());
        for ((index, capacity), share) in open.into_iter().zip(shares) {
            let give = share.minor().min(capacity);
            overflow += share.minor() - give;
            granted[index] += give;
            if capacity - give > 0 {
                still_open.push((index, capacity - give));
            }
        }

        open = still_open;
        pool = Money::new(overflow, currency);
        // Each pass with a positive pool closed at least one child (overflow
        // only arises from capped shares), so this terminates.
    }

    let allocations = collect_allocations(children, &granted, currency);
    Ok(FanOutPlan {
        retained: pool,
        allocations,
    })
}

/// Sequential: children ordered by explicit priority (creation order as the
/// fallback); the deposit fills the first child with remaining capacity up to
/// its target, the rest cascades onwards, leftover stays on the parent.
fn plan_sequential(deposit: Money, children: &[Goal]) -> ResultEngine<FanOutPlan> {
    let currency = deposit.currency();

    let mut order: Vec<usize> = (0..children.len()).collect();
    order.sort_by_key(|&index| {
        let child = &children[index];
        (child.priority.unwrap_or(i32::MAX), child.created_at)
    });

    let mut granted = vec![0i64; children.len()];
    let mut pool = deposit.minor();
    for index in order {
        if pool == 0 {
            break;
        }
        let capacity = children[index].remaining_capacity()?.minor();
        let give = pool.min(capacity);
        granted[index] = give;
        pool -= give;
    }

    let allocations = collect_allocations(children, &granted, currency);
    Ok(FanOutPlan {
        retained: Money::new(pool, currency),
        allocations,
    })
}

fn collect_allocations(
    children: &[Goal],
    granted: &[i64],
    currency: Currency,
) -> Vec<ChildAllocation> {
    children
        .iter()
        .zip(granted)
        .filter(|(_, minor)| **minor > 0)
        .map(|(child, minor)| ChildAllocation {
            goal_id: child.id,
            amount: Money::new(*minor, currency),
        })
        .collect()
}
