use chrono::{NaiveDate, Utc};
use engine::{ActionKind, Currency, Engine, GoalSpec, Money, PlanStatus};

fn engine() -> Engine {
    Engine::builder().build().unwrap()
}

fn eur(minor: i64) -> Money {
    Money::new(minor, Currency::Eur)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn unaffordable_deadline_produces_an_action_plan() {
    let engine = engine();
    let goal = engine
        .create_goal(
            GoalSpec::new("alice", "Car", eur(1200)).target_date(date(2026, 7, 1)),
        )
        .unwrap();

    let plan = engine
        .calculate_plan("alice", goal.id, eur(150), date(2026, 1, 1))
        .unwrap();

    assert_eq!(plan.monthly_deposit, eur(200));
    assert_eq!(plan.horizon_months, 6);
    assert!(!plan.is_viable);

    let cut = plan
        .action_plan
        .iter()
        .find(|i| i.kind == ActionKind::Cut)
        .unwrap();
    assert!(cut.value >= eur(50));
}

#[test]
fn affordable_deadline_is_viable_with_no_actions() {
    let engine = engine();
    let goal = engine
        .create_goal(
            GoalSpec::new("alice", "Car", eur(1200)).target_date(date(2026, 7, 1)),
        )
        .unwrap();
    engine
        .deposit("alice", goal.id, eur(600), Utc::now(), None)
        .unwrap();

    let plan = engine
        .calculate_plan("alice", goal.id, eur(150), date(2026, 1, 1))
        .unwrap();

    // Only 600 remains over 6 months.
    assert_eq!(plan.monthly_deposit, eur(100));
    assert!(plan.is_viable);
    assert!(plan.action_plan.is_empty());
}

#[test]
fn goal_without_deadline_uses_the_configured_horizon() {
    let engine = Engine::builder().default_horizon_months(6).build().unwrap();
    let goal = engine
        .create_goal(GoalSpec::new("alice", "Someday", eur(1200)))
        .unwrap();

    let plan = engine
        .calculate_plan("alice", goal.id, eur(10), date(2026, 1, 1))
        .unwrap();

    assert!(plan.default_horizon);
    assert_eq!(plan.horizon_months, 6);
    assert_eq!(plan.monthly_deposit, eur(200));
    assert!(plan.is_viable);
}

#[test]
fn accepting_a_plan_is_idempotent() {
    let engine = engine();
    let goal = engine
        .create_goal(
            GoalSpec::new("alice", "Car", eur(1200)).target_date(date(2026, 7, 1)),
        )
        .unwrap();

    let plan = engine
        .calculate_plan("alice", goal.id, eur(150), date(2026, 1, 1))
        .unwrap();
    let first = engine.accept_plan("alice", &plan).unwrap();
    let second = engine.accept_plan("alice", &plan).unwrap();

    // Accepting twice must not double-apply.
    assert_eq!(first.id, second.id);
    assert_eq!(engine.plan_history("alice", goal.id).unwrap().len(), 1);
}

#[test]
fn accepting_a_new_plan_supersedes_the_active_one() {
    let engine = engine();
    let goal = engine
        .create_goal(
            GoalSpec::new("alice", "Car", eur(1200)).target_date(date(2026, 7, 1)),
        )
        .unwrap();

    let first = engine
        .calculate_plan("alice", goal.id, eur(150), date(2026, 1, 1))
        .unwrap();
    engine.accept_plan("alice", &first).unwrap();

    // Cash flow improved; the recalculated plan differs.
    engine
        .deposit("alice", goal.id, eur(600), Utc::now(), None)
        .unwrap();
    let second = engine
        .calculate_plan("alice", goal.id, eur(150), date(2026, 1, 1))
        .unwrap();
    let accepted = engine.accept_plan("alice", &second).unwrap();

    let active = engine.active_plan("alice", goal.id).unwrap().unwrap();
    assert_eq!(active.id, accepted.id);

    let history = engine.plan_history("alice", goal.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, PlanStatus::Superseded);
    assert_eq!(history[1].status, PlanStatus::Active);
}

#[test]
fn funded_goal_needs_no_plan() {
    let engine = engine();
    let goal = engine
        .create_goal(
            GoalSpec::new("alice", "Car", eur(1000)).target_date(date(2026, 7, 1)),
        )
        .unwrap();
    engine
        .deposit("alice", goal.id, eur(1000), Utc::now(), None)
        .unwrap();

    let plan = engine
        .calculate_plan("alice", goal.id, eur(0), date(2026, 1, 1))
        .unwrap();
    assert!(plan.is_viable);
    assert!(plan.monthly_deposit.is_zero());
    assert!(plan.action_plan.is_empty());
}
