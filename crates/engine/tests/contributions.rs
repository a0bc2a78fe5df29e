use chrono::Utc;
use engine::{Currency, DistributionStrategy, Engine, EngineError, Goal, GoalSpec, Money};

fn engine() -> Engine {
    Engine::builder().build().unwrap()
}

fn eur(minor: i64) -> Money {
    Money::new(minor, Currency::Eur)
}

fn goal(engine: &Engine, name: &str, target: i64) -> Goal {
    engine
        .create_goal(GoalSpec::new("alice", name, eur(target)))
        .unwrap()
}

#[test]
fn deposit_and_withdraw_update_the_balance() {
    let engine = engine();
    let goal = goal(&engine, "Trip", 10_000);

    let after = engine
        .deposit("alice", goal.id, eur(2500), Utc::now(), None)
        .unwrap();
    assert_eq!(after.current_amount, eur(2500));

    let after = engine
        .withdraw("alice", goal.id, eur(500), Utc::now(), Some("flight refund"))
        .unwrap();
    assert_eq!(after.current_amount, eur(2000));
    assert_eq!(engine.balance_of("alice", goal.id).unwrap(), eur(2000));
}

#[test]
fn deposit_rejects_non_positive_and_mixed_currency() {
    let engine = engine();
    let goal = goal(&engine, "Trip", 10_000);

    let err = engine
        .deposit("alice", goal.id, eur(0), Utc::now(), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .deposit(
            "alice",
            goal.id,
            Money::new(100, Currency::Usd),
            Utc::now(),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::CurrencyMismatch(_)));
}

#[test]
fn failed_withdrawal_never_mutates_the_ledger() {
    let engine = engine();
    let goal = goal(&engine, "Trip", 10_000);
    engine
        .deposit("alice", goal.id, eur(1000), Utc::now(), None)
        .unwrap();

    let err = engine
        .withdraw("alice", goal.id, eur(1001), Utc::now(), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    assert_eq!(engine.entries("alice", goal.id).unwrap().len(), 1);
    assert_eq!(engine.balance_of("alice", goal.id).unwrap(), eur(1000));
}

#[test]
fn allow_negative_goals_may_overdraw() {
    let engine = engine();
    let goal = engine
        .create_goal(GoalSpec::new("alice", "Buffer", eur(10_000)).allow_negative())
        .unwrap();

    let after = engine
        .withdraw("alice", goal.id, eur(300), Utc::now(), None)
        .unwrap();
    assert_eq!(after.current_amount, eur(-300));
}

#[test]
fn replaying_the_entry_log_is_idempotent() {
    let engine = engine();
    let goal = goal(&engine, "Trip", 10_000);
    for (minor, withdraw) in [(1000, false), (250, true), (400, false), (150, true)] {
        if withdraw {
            engine
                .withdraw("alice", goal.id, eur(minor), Utc::now(), None)
                .unwrap();
        } else {
            engine
                .deposit("alice", goal.id, eur(minor), Utc::now(), None)
                .unwrap();
        }
    }

    let cached = engine.balance_of("alice", goal.id).unwrap();
    for _ in 0..3 {
        let replayed = engine.recompute_balance("alice", goal.id).unwrap();
        assert_eq!(replayed.current_amount, cached);
    }
    assert_eq!(cached, eur(1000));
}

#[test]
fn proportional_fan_out_splits_by_target_ratio() {
    let engine = engine();
    let parent = engine
        .create_goal(
            GoalSpec::new("alice", "House", eur(500_000))
                .strategy(DistributionStrategy::Proportional),
        )
        .unwrap();
    let small = engine
        .create_goal(GoalSpec::new("alice", "Fees", eur(1000)).parent(parent.id))
        .unwrap();
    let big = engine
        .create_goal(GoalSpec::new("alice", "Down Payment", eur(3000)).parent(parent.id))
        .unwrap();

    engine
        .deposit("alice", parent.id, eur(400), Utc::now(), None)
        .unwrap();

    assert_eq!(engine.balance_of("alice", small.id).unwrap(), eur(100));
    assert_eq!(engine.balance_of("alice", big.id).unwrap(), eur(300));
    assert_eq!(engine.balance_of("alice", parent.id).unwrap(), eur(0));

    // Child entries link back to the originating parent entry.
    let parent_entries = engine.entries("alice", parent.id).unwrap();
    assert_eq!(parent_entries.len(), 1);
    assert_eq!(parent_entries[0].amount, eur(0));
    let child_entries = engine.entries("alice", small.id).unwrap();
    assert_eq!(
        child_entries[0].source_contribution_id,
        Some(parent_entries[0].id)
    );
}

#[test]
fn sequential_fan_out_cascades_overflow() {
    let engine = engine();
    let parent = engine
        .create_goal(
            GoalSpec::new("alice", "Plans", eur(100_000))
                .strategy(DistributionStrategy::Sequential),
        )
        .unwrap();
    let first = engine
        .create_goal(
            GoalSpec::new("alice", "A", eur(100))
                .parent(parent.id)
                .priority(1),
        )
        .unwrap();
    let second = engine
        .create_goal(
            GoalSpec::new("alice", "B", eur(500))
                .parent(parent.id)
                .priority(2),
        )
        .unwrap();
    engine
        .deposit("alice", first.id, eur(80), Utc::now(), None)
        .unwrap();

    engine
        .deposit("alice", parent.id, eur(50), Utc::now(), None)
        .unwrap();

    assert_eq!(engine.balance_of("alice", first.id).unwrap(), eur(100));
    assert_eq!(engine.balance_of("alice", second.id).unwrap(), eur(30));
    assert_eq!(engine.balance_of("alice", parent.id).unwrap(), eur(0));
}

#[test]
fn withdrawals_never_cascade_to_children() {
    let engine = engine();
    let parent = engine
        .create_goal(
            GoalSpec::new("alice", "House", eur(10_000))
                .strategy(DistributionStrategy::Proportional),
        )
        .unwrap();
    let child = engine
        .create_goal(GoalSpec::new("alice", "Fees", eur(5000)).parent(parent.id))
        .unwrap();

    engine
        .deposit("alice", child.id, eur(1000), Utc::now(), None)
        .unwrap();
    // 4000 fills the child to target; the parent retains the rest.
    engine
        .deposit("alice", parent.id, eur(5000), Utc::now(), None)
        .unwrap();
    assert_eq!(engine.balance_of("alice", parent.id).unwrap(), eur(1000));

    engine
        .withdraw("alice", parent.id, eur(1000), Utc::now(), None)
        .unwrap();

    assert_eq!(engine.balance_of("alice", parent.id).unwrap(), eur(0));
    // The child keeps everything it received.
    assert_eq!(engine.balance_of("alice", child.id).unwrap(), eur(5000));
}

#[test]
fn reversing_a_fan_out_deposit_compensates_the_whole_batch() {
    let engine = engine();
    let parent = engine
        .create_goal(
            GoalSpec::new("alice", "House", eur(100_000))
                .strategy(DistributionStrategy::Proportional),
        )
        .unwrap();
    let child = engine
        .create_goal(GoalSpec::new("alice", "Fees", eur(1000)).parent(parent.id))
        .unwrap();

    engine
        .deposit("alice", parent.id, eur(400), Utc::now(), None)
        .unwrap();
    assert_eq!(engine.balance_of("alice", child.id).unwrap(), eur(400));

    let origin = engine.entries("alice", parent.id).unwrap()[0].clone();
    let compensations = engine
        .reverse_contribution("alice", origin.id, Utc::now())
        .unwrap();
    assert_eq!(compensations.len(), 2);

    assert_eq!(engine.balance_of("alice", parent.id).unwrap(), eur(0));
    assert_eq!(engine.balance_of("alice", child.id).unwrap(), eur(0));

    // History is append-only: the original entries are still there.
    assert_eq!(engine.entries("alice", child.id).unwrap().len(), 2);

    let err = engine
        .reverse_contribution("alice", origin.id, Utc::now())
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn concurrent_deposits_to_one_parent_do_not_interleave() {
    let engine = engine();
    let parent = engine
        .create_goal(
            GoalSpec::new("alice", "House", eur(1_000_000))
                .strategy(DistributionStrategy::Proportional),
        )
        .unwrap();
    for name in ["A", "B"] {
        engine
            .create_goal(GoalSpec::new("alice", name, eur(400_000)).parent(parent.id))
            .unwrap();
    }

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                engine
                    .deposit("alice", parent.id, eur(100), Utc::now(), None)
                    .unwrap();
            });
        }
    });

    // Every cent of the 8 deposits landed somewhere in the tree.
    let total: i64 = engine
        .list_goals("alice")
        .unwrap()
        .iter()
        .map(|g| g.current_amount.minor())
        .sum();
    assert_eq!(total, 800);
}
