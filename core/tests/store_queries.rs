//! Read-side queries used by the runner and by reporting.

use chrono::NaiveDate;
use commission_core::{
    command::{Command, EmployeeChanges, NewProject},
    engine::CompEngine,
    types::{Period, Role},
};

fn signed(employee_id: i64, value: f64, y: i32, m: u32, d: u32) -> NewProject {
    NewProject {
        employee_id,
        client_name: "Umbrella".into(),
        project_value: value,
        product_type: "licences".into(),
        signature_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        is_from_social_media: false,
        notes: Some("renewal".into()),
    }
}

#[test]
fn team_membership_follows_employee_updates() {
    let mut engine = CompEngine::build_test().unwrap();
    let north = engine.create_team("North", None).unwrap();
    let south = engine.create_team("South", None).unwrap();
    let a = engine.register_employee("A", Role::SalesRep, 3_000.0, Some(north)).unwrap();
    let b = engine.register_employee("B", Role::TeamLeader, 4_000.0, Some(north)).unwrap();

    engine
        .execute(Command::UpdateEmployee {
            employee_id: b,
            changes: EmployeeChanges { team_id: Some(Some(south)), ..Default::default() },
        })
        .unwrap();

    assert_eq!(engine.store().team_members(north).unwrap(), vec![a]);
    assert_eq!(engine.store().team_members(south).unwrap(), vec![b]);
    assert_eq!(engine.store().get_team(north).unwrap().unwrap().name, "North");
}

#[test]
fn null_team_removes_the_employee_from_their_team() {
    let mut engine = CompEngine::build_test().unwrap();
    let north = engine.create_team("North", None).unwrap();
    let a = engine.register_employee("A", Role::SalesRep, 3_000.0, Some(north)).unwrap();

    // A missing team_id leaves membership alone.
    engine
        .execute(Command::UpdateEmployee {
            employee_id: a,
            changes: EmployeeChanges { base_salary: Some(3_200.0), ..Default::default() },
        })
        .unwrap();
    assert_eq!(engine.store().get_employee(a).unwrap().unwrap().team_id, Some(north));

    let cleared: Command = serde_json::from_str(&format!(
        r#"{{"cmd":"update_employee","employee_id":{a},"changes":{{"team_id":null}}}}"#
    ))
    .unwrap();
    engine.execute(cleared).unwrap();

    assert_eq!(engine.store().get_employee(a).unwrap().unwrap().team_id, None);
    assert!(engine.store().team_members(north).unwrap().is_empty());
}

#[test]
fn projects_filter_by_employee_and_period() {
    let mut engine = CompEngine::build_test().unwrap();
    let a = engine.register_employee("A", Role::SalesRep, 3_000.0, None).unwrap();
    let b = engine.register_employee("B", Role::SalesRep, 3_000.0, None).unwrap();
    engine.sign_project(signed(a, 1_000.0, 2024, 3, 1)).unwrap();
    engine.sign_project(signed(a, 2_000.0, 2024, 4, 1)).unwrap();
    engine.sign_project(signed(b, 3_000.0, 2024, 3, 9)).unwrap();

    let march = Period::new(3, 2024).unwrap();
    let store = engine.store();
    assert_eq!(store.list_projects(None, None).unwrap().len(), 3);
    assert_eq!(store.list_projects(Some(a), None).unwrap().len(), 2);
    assert_eq!(store.list_projects(None, Some(march)).unwrap().len(), 2);

    let only = store.list_projects(Some(a), Some(march)).unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].project_value, 1_000.0);
    assert_eq!(only[0].notes.as_deref(), Some("renewal"));
    assert!(march.contains(only[0].signature_date));
}

#[test]
fn budgets_list_newest_first() {
    let mut engine = CompEngine::build_test().unwrap();
    engine.set_marketing_budget(Period::new(1, 2024).unwrap(), 100.0).unwrap();
    engine.set_marketing_budget(Period::new(3, 2024).unwrap(), 300.0).unwrap();
    engine.set_marketing_budget(Period::new(12, 2023).unwrap(), 50.0).unwrap();

    let periods: Vec<String> = engine
        .store()
        .list_budgets()
        .unwrap()
        .iter()
        .map(|b| b.period.to_string())
        .collect();
    assert_eq!(periods, vec!["2024-03", "2024-01", "2023-12"]);
}

#[test]
fn scores_and_targets_list_per_period() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    let a = engine.register_employee("A", Role::SalesRep, 3_000.0, None).unwrap();
    let b = engine.register_employee("B", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(a, march, 10_000.0).unwrap();
    engine.set_target(b, march, 20_000.0).unwrap();
    let kpi = engine.create_kpi("nps", 0.2, 10.0).unwrap();
    engine.record_score(a, kpi, march, 5.0).unwrap();

    let targets = engine.store().targets_for_period(march).unwrap();
    assert_eq!(targets.iter().map(|t| t.employee_id).collect::<Vec<_>>(), vec![a, b]);

    let scores = engine.store().scores_for(a, march).unwrap();
    assert_eq!(scores.len(), 1);
    assert!((scores[0].weighted_score - 1.0).abs() < 1e-12);
    assert!(engine.store().scores_for(b, march).unwrap().is_empty());
}

#[test]
fn commissions_list_per_period() {
    let mut engine = CompEngine::build_test().unwrap();
    let march = Period::new(3, 2024).unwrap();
    engine.register_employee("A", Role::SalesRep, 3_000.0, None).unwrap();
    engine.register_employee("B", Role::SalesManager, 6_000.0, None).unwrap();
    engine.calculate_commissions(march, Vec::new()).unwrap();

    let rows = engine.store().commissions_for_period(march).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(engine
        .store()
        .commissions_for_period(Period::new(4, 2024).unwrap())
        .unwrap()
        .is_empty());
}
