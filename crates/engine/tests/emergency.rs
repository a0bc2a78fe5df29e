use chrono::Utc;
use engine::{Currency, Engine, EngineError, FundStatus, GoalSpec, Money};

fn engine() -> Engine {
    Engine::builder().build().unwrap()
}

fn eur(minor: i64) -> Money {
    Money::new(minor, Currency::Eur)
}

#[test]
fn init_derives_a_six_month_target() {
    let engine = engine();
    let fund = engine.init_emergency_fund("alice", eur(5000)).unwrap();

    assert_eq!(fund.goal.target_amount, eur(30_000));
    assert_eq!(fund.status, FundStatus::Critical);
    assert_eq!(fund.months_covered_tenths, 0);
}

#[test]
fn init_is_singleton_per_user() {
    let engine = engine();
    engine.init_emergency_fund("alice", eur(5000)).unwrap();

    let err = engine.init_emergency_fund("alice", eur(4000)).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Another user still gets their own fund.
    engine.init_emergency_fund("bob", eur(4000)).unwrap();
}

#[test]
fn status_follows_the_balance_without_staleness() {
    let engine = engine();
    let fund = engine.init_emergency_fund("alice", eur(5000)).unwrap();
    let fund_id = fund.goal.id;

    engine
        .deposit("alice", fund_id, eur(4000), Utc::now(), None)
        .unwrap();
    let snapshot = engine.emergency_fund("alice").unwrap();
    // 0.8 months covered.
    assert_eq!(snapshot.status, FundStatus::Critical);
    assert_eq!(snapshot.months_covered_tenths, 8);

    engine
        .deposit("alice", fund_id, eur(11_000), Utc::now(), None)
        .unwrap();
    assert_eq!(engine.emergency_fund("alice").unwrap().status, FundStatus::Secure);

    // The status must be fresh immediately after the withdrawal commits.
    engine
        .withdraw("alice", fund_id, eur(15_000), Utc::now(), Some("car repair"))
        .unwrap();
    let snapshot = engine.emergency_fund("alice").unwrap();
    assert_eq!(snapshot.status, FundStatus::Critical);
    assert_eq!(snapshot.months_covered_tenths, 0);
}

#[test]
fn a_single_deposit_may_jump_from_critical_to_secure() {
    let engine = engine();
    let fund = engine.init_emergency_fund("alice", eur(5000)).unwrap();
    assert_eq!(fund.status, FundStatus::Critical);

    engine
        .deposit("alice", fund.goal.id, eur(30_000), Utc::now(), None)
        .unwrap();
    assert_eq!(engine.emergency_fund("alice").unwrap().status, FundStatus::Secure);
}

#[test]
fn withdrawals_require_a_reason() {
    let engine = engine();
    let fund = engine.init_emergency_fund("alice", eur(5000)).unwrap();
    engine
        .deposit("alice", fund.goal.id, eur(10_000), Utc::now(), None)
        .unwrap();

    let err = engine
        .withdraw("alice", fund.goal.id, eur(1000), Utc::now(), None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    engine
        .withdraw("alice", fund.goal.id, eur(1000), Utc::now(), Some("dentist"))
        .unwrap();
}

#[test]
fn more_money_never_worsens_the_status() {
    let engine = engine();
    let fund = engine.init_emergency_fund("alice", eur(5000)).unwrap();

    let mut previous = FundStatus::Critical;
    for _ in 0..20 {
        engine
            .deposit("alice", fund.goal.id, eur(1500), Utc::now(), None)
            .unwrap();
        let status = engine.emergency_fund("alice").unwrap().status;
        assert!(status >= previous);
        previous = status;
    }
    assert_eq!(previous, FundStatus::Secure);
}

#[test]
fn updating_monthly_expenses_rederives_the_target() {
    let engine = engine();
    engine.init_emergency_fund("alice", eur(5000)).unwrap();

    let fund = engine.set_monthly_expenses("alice", eur(6000)).unwrap();
    assert_eq!(fund.goal.target_amount, eur(36_000));
    assert_eq!(fund.monthly_expenses, eur(6000));
}

#[test]
fn emergency_fund_stays_flat() {
    let engine = engine();
    let fund = engine.init_emergency_fund("alice", eur(5000)).unwrap();

    let err = engine
        .create_goal(GoalSpec::new("alice", "Sub-fund", eur(100)).parent(fund.goal.id))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
