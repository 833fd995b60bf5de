//! Achievement: target progress follows the projects signed against it.

use chrono::NaiveDate;
use commission_core::{
    command::{Command, NewProject, ProjectChanges},
    engine::CompEngine,
    types::{Period, Role},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn project(employee_id: i64, value: f64, signed: NaiveDate) -> NewProject {
    NewProject {
        employee_id,
        client_name: "Acme".into(),
        project_value: value,
        product_type: "software".into(),
        signature_date: signed,
        is_from_social_media: false,
        notes: None,
    }
}

#[test]
fn signing_updates_achieved_amount() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march, 100_000.0).unwrap();

    engine.sign_project(project(rep, 60_000.0, date(2024, 3, 5))).unwrap();
    engine.sign_project(project(rep, 15_000.0, date(2024, 3, 20))).unwrap();
    // Different month: must not count toward March.
    engine.sign_project(project(rep, 99_000.0, date(2024, 4, 1))).unwrap();

    let target = engine.store().get_target(rep, march).unwrap().unwrap();
    assert_eq!(target.achieved_amount, 75_000.0);
    assert!((target.achievement_percentage - 0.75).abs() < 1e-12);
}

#[test]
fn target_set_after_projects_picks_them_up() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.sign_project(project(rep, 40_000.0, date(2024, 3, 5))).unwrap();

    engine.set_target(rep, march, 80_000.0).unwrap();

    let target = engine.store().get_target(rep, march).unwrap().unwrap();
    assert_eq!(target.achieved_amount, 40_000.0);
    assert_eq!(target.achievement_percentage, 0.5);
}

#[test]
fn refresh_is_idempotent() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march, 100_000.0).unwrap();
    engine.sign_project(project(rep, 60_000.0, date(2024, 3, 5))).unwrap();

    engine.execute(Command::RefreshTarget { employee_id: rep, period: march }).unwrap();
    let first = engine.store().get_target(rep, march).unwrap().unwrap();
    engine.execute(Command::RefreshTarget { employee_id: rep, period: march }).unwrap();
    let second = engine.store().get_target(rep, march).unwrap().unwrap();

    assert_eq!(first.target_amount, second.target_amount);
    assert_eq!(first.achieved_amount, second.achieved_amount);
    assert_eq!(first.achievement_percentage, second.achievement_percentage);
}

#[test]
fn zero_target_yields_zero_ratio() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march, 0.0).unwrap();

    let p = engine.sign_project(project(rep, 60_000.0, date(2024, 3, 5))).unwrap();

    let target = engine.store().get_target(rep, march).unwrap().unwrap();
    assert_eq!(target.achieved_amount, 60_000.0);
    assert_eq!(target.achievement_percentage, 0.0);
    // Ratio 0 lands in the lowest tier.
    assert_eq!(p.commission_rate, 0.01);
}

#[test]
fn moving_a_project_refreshes_both_months() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    let april = Period::new(4, 2024).unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march, 100_000.0).unwrap();
    engine.set_target(rep, april, 100_000.0).unwrap();
    let p = engine.sign_project(project(rep, 30_000.0, date(2024, 3, 31))).unwrap();

    engine
        .execute(Command::UpdateProject {
            project_id: p.project_id,
            changes: ProjectChanges {
                signature_date: Some(date(2024, 4, 2)),
                ..Default::default()
            },
        })
        .unwrap();

    assert_eq!(engine.store().get_target(rep, march).unwrap().unwrap().achieved_amount, 0.0);
    assert_eq!(engine.store().get_target(rep, april).unwrap().unwrap().achieved_amount, 30_000.0);
}

#[test]
fn removing_a_project_reduces_achievement() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march, 100_000.0).unwrap();
    let p = engine.sign_project(project(rep, 30_000.0, date(2024, 3, 3))).unwrap();
    engine.sign_project(project(rep, 20_000.0, date(2024, 3, 4))).unwrap();

    engine.execute(Command::RemoveProject { project_id: p.project_id }).unwrap();

    let target = engine.store().get_target(rep, march).unwrap().unwrap();
    assert_eq!(target.achieved_amount, 20_000.0);
    assert_eq!(target.achievement_percentage, 0.2);
}
