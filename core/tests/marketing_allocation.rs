//! Marketing allocation: the month's budget is spread over its social
//! projects by value share and netted out of their commission.

use chrono::NaiveDate;
use commission_core::{
    command::{Command, NewProject, ProjectChanges},
    engine::CompEngine,
    event::{AllocationSkip, CompEvent},
    types::{EmployeeId, Period, Role},
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

fn march() -> Period {
    Period::new(3, 2024).unwrap()
}

fn project(employee_id: EmployeeId, value: f64, social: bool, day: u32) -> NewProject {
    NewProject {
        employee_id,
        client_name: format!("client-{day}"),
        project_value: value,
        product_type: "ads".into(),
        signature_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        is_from_social_media: social,
        notes: None,
    }
}

fn setup() -> (CompEngine, EmployeeId) {
    let mut engine = CompEngine::build_test().unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march(), 1_000_000.0).unwrap();
    (engine, rep)
}

fn allocated_sum(engine: &CompEngine) -> f64 {
    engine
        .store()
        .list_social_projects(march())
        .unwrap()
        .iter()
        .map(|p| p.marketing_cost_allocated)
        .sum()
}

#[test]
fn budget_split_by_value_share() {
    let (mut engine, rep) = setup();
    let big = engine.sign_project(project(rep, 80_000.0, true, 3)).unwrap();
    let small = engine.sign_project(project(rep, 20_000.0, true, 4)).unwrap();
    engine.set_marketing_budget(march(), 10_000.0).unwrap();

    let big = engine.store().get_project(big.project_id).unwrap().unwrap();
    let small = engine.store().get_project(small.project_id).unwrap().unwrap();
    assert!((big.marketing_cost_allocated - 8_000.0).abs() < 1e-6);
    assert!((small.marketing_cost_allocated - 2_000.0).abs() < 1e-6);

    let budget = engine.store().get_budget(march()).unwrap().unwrap();
    assert!((budget.allocated_budget - 10_000.0).abs() < 1e-6);
    assert!(budget.remaining_budget.abs() < 1e-6);
}

#[test]
fn net_commission_is_floored_at_zero() {
    let (mut engine, rep) = setup();
    let big = engine.sign_project(project(rep, 80_000.0, true, 3)).unwrap();
    let small = engine.sign_project(project(rep, 20_000.0, true, 4)).unwrap();
    engine.set_marketing_budget(march(), 10_000.0).unwrap();

    // Ratios stay low against a 1M target: 0.01 - 0.005 = 0.005.
    // 80k × 0.005 = 400 raw, far below the 8000 allocated.
    for id in [big.project_id, small.project_id] {
        let p = engine.store().get_project(id).unwrap().unwrap();
        assert!(p.raw_commission > 0.0);
        assert_eq!(p.final_commission, 0.0);
    }
}

#[test]
fn partial_deduction_leaves_the_remainder() {
    let mut engine = CompEngine::build_test().unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march(), 100_000.0).unwrap();
    // 60k of 100k: 0.015 - 0.005 = 0.01, raw 600.
    let p = engine.sign_project(project(rep, 60_000.0, true, 10)).unwrap();
    engine.set_marketing_budget(march(), 250.0).unwrap();

    let p = engine.store().get_project(p.project_id).unwrap().unwrap();
    assert!((p.marketing_cost_allocated - 250.0).abs() < 1e-9);
    assert!((p.final_commission - 350.0).abs() < 1e-6);
}

#[test]
fn rerunning_allocation_never_double_deducts() {
    let mut engine = CompEngine::build_test().unwrap();
    let rep = engine.register_employee("Rep", Role::SalesRep, 3_000.0, None).unwrap();
    engine.set_target(rep, march(), 100_000.0).unwrap();
    let p = engine.sign_project(project(rep, 60_000.0, true, 10)).unwrap();
    engine.set_marketing_budget(march(), 250.0).unwrap();

    let once = engine.store().get_project(p.project_id).unwrap().unwrap();
    engine.execute(Command::ReallocateMarketing { period: march() }).unwrap();
    let twice = engine.store().get_project(p.project_id).unwrap().unwrap();
    engine.execute(Command::ReallocateMarketing { period: march() }).unwrap();
    let thrice = engine.store().get_project(p.project_id).unwrap().unwrap();

    assert_eq!(once.final_commission, twice.final_commission);
    assert_eq!(twice.final_commission, thrice.final_commission);
    assert_eq!(once.marketing_cost_allocated, thrice.marketing_cost_allocated);
}

#[test]
fn allocation_waits_for_a_budget() {
    let (mut engine, rep) = setup();
    let events = engine.execute(Command::SignProject(project(rep, 50_000.0, true, 5))).unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        CompEvent::MarketingAllocationSkipped { reason: AllocationSkip::NoBudget, .. }
    )));
    assert_eq!(allocated_sum(&engine), 0.0);

    engine.set_marketing_budget(march(), 4_000.0).unwrap();
    assert!((allocated_sum(&engine) - 4_000.0).abs() < 1e-6);
}

#[test]
fn new_social_project_reshuffles_existing_shares() {
    let (mut engine, rep) = setup();
    engine.set_marketing_budget(march(), 9_000.0).unwrap();
    let a = engine.sign_project(project(rep, 30_000.0, true, 3)).unwrap();
    assert!((a.marketing_cost_allocated - 9_000.0).abs() < 1e-6);

    engine.sign_project(project(rep, 60_000.0, true, 4)).unwrap();
    let a = engine.store().get_project(a.project_id).unwrap().unwrap();
    assert!((a.marketing_cost_allocated - 3_000.0).abs() < 1e-6);
    assert!((allocated_sum(&engine) - 9_000.0).abs() < 1e-6);
}

#[test]
fn non_social_projects_take_no_share() {
    let (mut engine, rep) = setup();
    engine.set_marketing_budget(march(), 5_000.0).unwrap();
    let plain = engine.sign_project(project(rep, 70_000.0, false, 3)).unwrap();
    let social = engine.sign_project(project(rep, 10_000.0, true, 4)).unwrap();

    let plain = engine.store().get_project(plain.project_id).unwrap().unwrap();
    let social = engine.store().get_project(social.project_id).unwrap().unwrap();
    assert_eq!(plain.marketing_cost_allocated, 0.0);
    assert!((social.marketing_cost_allocated - 5_000.0).abs() < 1e-6);
}

#[test]
fn budget_change_redistributes_the_new_total() {
    let (mut engine, rep) = setup();
    engine.sign_project(project(rep, 25_000.0, true, 3)).unwrap();
    engine.sign_project(project(rep, 75_000.0, true, 4)).unwrap();
    engine.set_marketing_budget(march(), 10_000.0).unwrap();
    engine.set_marketing_budget(march(), 2_000.0).unwrap();

    let shares: Vec<f64> = engine
        .store()
        .list_social_projects(march())
        .unwrap()
        .iter()
        .map(|p| p.marketing_cost_allocated)
        .collect();
    assert!((shares[0] - 500.0).abs() < 1e-6);
    assert!((shares[1] - 1_500.0).abs() < 1e-6);
}

#[test]
fn project_leaving_social_channel_drops_its_allocation() {
    let (mut engine, rep) = setup();
    engine.set_marketing_budget(march(), 6_000.0).unwrap();
    let a = engine.sign_project(project(rep, 50_000.0, true, 3)).unwrap();
    let b = engine.sign_project(project(rep, 50_000.0, true, 4)).unwrap();

    engine
        .execute(Command::UpdateProject {
            project_id: a.project_id,
            changes: ProjectChanges { is_from_social_media: Some(false), ..Default::default() },
        })
        .unwrap();

    let a = engine.store().get_project(a.project_id).unwrap().unwrap();
    let b = engine.store().get_project(b.project_id).unwrap().unwrap();
    assert_eq!(a.marketing_cost_allocated, 0.0);
    assert_eq!(a.final_commission, a.raw_commission);
    assert!((b.marketing_cost_allocated - 6_000.0).abs() < 1e-6);
}

#[test]
fn moving_a_project_reallocates_both_months() {
    let (mut engine, rep) = setup();
    let april = Period::new(4, 2024).unwrap();
    engine.set_marketing_budget(march(), 6_000.0).unwrap();
    engine.set_marketing_budget(april, 4_000.0).unwrap();
    let a = engine.sign_project(project(rep, 50_000.0, true, 3)).unwrap();
    let b = engine.sign_project(project(rep, 50_000.0, true, 4)).unwrap();
    let mut in_april = project(rep, 30_000.0, true, 5);
    in_april.signature_date = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
    let c = engine.sign_project(in_april).unwrap();

    engine
        .execute(Command::UpdateProject {
            project_id: a.project_id,
            changes: ProjectChanges {
                signature_date: NaiveDate::from_ymd_opt(2024, 4, 20),
                ..Default::default()
            },
        })
        .unwrap();

    let a = engine.store().get_project(a.project_id).unwrap().unwrap();
    let b = engine.store().get_project(b.project_id).unwrap().unwrap();
    let c = engine.store().get_project(c.project_id).unwrap().unwrap();
    assert_eq!(a.period, april);

    // March keeps one social project, which now absorbs the whole budget.
    assert!((b.marketing_cost_allocated - 6_000.0).abs() < 1e-6);
    let march_budget = engine.store().get_budget(march()).unwrap().unwrap();
    assert!((march_budget.allocated_budget - 6_000.0).abs() < 1e-6);
    assert!(march_budget.remaining_budget.abs() < 1e-6);

    // April splits 4000 over 50k + 30k.
    assert!((a.marketing_cost_allocated - 2_500.0).abs() < 1e-6);
    assert!((c.marketing_cost_allocated - 1_500.0).abs() < 1e-6);
    let april_budget = engine.store().get_budget(april).unwrap().unwrap();
    assert!((april_budget.allocated_budget - 4_000.0).abs() < 1e-6);
    assert!(april_budget.remaining_budget.abs() < 1e-6);
}

#[test]
fn removing_the_last_social_project_frees_the_budget() {
    let (mut engine, rep) = setup();
    engine.set_marketing_budget(march(), 6_000.0).unwrap();
    let a = engine.sign_project(project(rep, 50_000.0, true, 3)).unwrap();

    engine.execute(Command::RemoveProject { project_id: a.project_id }).unwrap();

    let budget = engine.store().get_budget(march()).unwrap().unwrap();
    assert_eq!(budget.allocated_budget, 0.0);
    assert_eq!(budget.remaining_budget, 6_000.0);
}

/// For any budget and any set of social projects, the allocations add
/// up to the budget and each is proportional to the project's value.
#[test]
fn allocations_always_sum_to_the_budget() {
    const SEED: u64 = 0xA110_CA7E;
    let mut rng = Pcg64Mcg::seed_from_u64(SEED);

    for round in 0..20 {
        let (mut engine, rep) = setup();
        let count = rng.gen_range(1..8);
        for day in 1..=count {
            let value = rng.gen_range(1_000.0..250_000.0);
            engine.sign_project(project(rep, value, true, day)).unwrap();
        }
        let budget: f64 = rng.gen_range(0.0..50_000.0);
        engine.set_marketing_budget(march(), budget).unwrap();

        let projects = engine.store().list_social_projects(march()).unwrap();
        let total_value: f64 = projects.iter().map(|p| p.project_value).sum();
        let total_alloc: f64 = projects.iter().map(|p| p.marketing_cost_allocated).sum();
        assert!(
            (total_alloc - budget).abs() < 1e-6,
            "round {round}: allocated {total_alloc} of {budget}"
        );
        for p in &projects {
            let expected = budget * p.project_value / total_value;
            assert!((p.marketing_cost_allocated - expected).abs() < 1e-6);
            assert!(p.final_commission >= 0.0);
        }
    }
}
