//! Command intake: validates a command and records the externally
//! authored facts it carries.
//!
//! Intake writes only what the caller supplied (employees, targets,
//! project facts, budgets, scores). Every derived figure is left to the
//! engine components, which react to the events returned here.

use crate::{
    command::{Command, EmployeeChanges, KpiChanges, NewProject, ProjectChanges, TeamChanges},
    error::{CompError, CompResult},
    event::CompEvent,
    marketing_subsystem::net_commission,
    store::{CompStore, EmployeeRow, KpiRow, ProjectRow, ScoreRow, TeamRow},
    types::{EmployeeId, KpiId, Period, ProjectId, Seq, TeamId},
};
use std::collections::BTreeSet;

pub(crate) fn apply(store: &CompStore, seq: Seq, command: &Command) -> CompResult<Vec<CompEvent>> {
    match command {
        Command::RegisterEmployee { name, role, base_salary, team_id } => {
            require_name("employee name", name)?;
            require_non_negative("base_salary", *base_salary)?;
            if let Some(team_id) = team_id {
                require_team(store, *team_id)?;
            }
            let employee_id = store.insert_employee(name.trim(), *role, *base_salary, *team_id, seq)?;
            Ok(vec![CompEvent::EmployeeRegistered {
                seq,
                employee_id,
                role: *role,
                base_salary: *base_salary,
            }])
        }

        Command::UpdateEmployee { employee_id, changes } => {
            update_employee(store, seq, *employee_id, changes)
        }

        Command::RemoveEmployee { employee_id } => remove_employee(store, seq, *employee_id),

        Command::CreateTeam { name, leader_id } => {
            require_name("team name", name)?;
            if let Some(leader_id) = leader_id {
                require_employee(store, *leader_id)?;
            }
            let team_id = store.insert_team(name.trim(), *leader_id, seq)?;
            Ok(vec![CompEvent::TeamCreated { seq, team_id, leader_id: *leader_id }])
        }

        Command::UpdateTeam { team_id, changes } => update_team(store, seq, *team_id, changes),

        Command::RemoveTeam { team_id } => {
            require_team(store, *team_id)?;
            let members = store.team_members(*team_id)?;
            if !members.is_empty() {
                return Err(CompError::in_use(
                    "team",
                    team_id,
                    format!("{} member(s)", members.len()),
                ));
            }
            store.delete_team(*team_id)?;
            Ok(vec![CompEvent::TeamRemoved { seq, team_id: *team_id }])
        }

        Command::SetTarget { employee_id, period, target_amount } => {
            let period = period.validated()?;
            require_non_negative("target_amount", *target_amount)?;
            require_employee(store, *employee_id)?;
            if store.get_target(*employee_id, period)?.is_some() {
                return Err(CompError::duplicate("target", target_key(*employee_id, period)));
            }
            store.insert_target(*employee_id, period, *target_amount, seq)?;
            Ok(vec![CompEvent::TargetSet {
                seq,
                employee_id: *employee_id,
                period,
                target_amount: *target_amount,
            }])
        }

        Command::UpdateTargetAmount { employee_id, period, target_amount } => {
            let period = period.validated()?;
            require_non_negative("target_amount", *target_amount)?;
            let target = store
                .get_target(*employee_id, period)?
                .ok_or_else(|| CompError::not_found("target", target_key(*employee_id, period)))?;
            store.update_target_amount(*employee_id, period, *target_amount, seq)?;
            Ok(vec![CompEvent::TargetAmountChanged {
                seq,
                employee_id: *employee_id,
                period,
                old_amount: target.target_amount,
                new_amount: *target_amount,
            }])
        }

        Command::RefreshTarget { employee_id, period } => {
            let period = period.validated()?;
            if store.get_target(*employee_id, period)?.is_none() {
                return Err(CompError::not_found("target", target_key(*employee_id, period)));
            }
            Ok(vec![CompEvent::TargetRefreshRequested { seq, employee_id: *employee_id, period }])
        }

        Command::RemoveTarget { employee_id, period } => {
            let period = period.validated()?;
            if store.get_target(*employee_id, period)?.is_none() {
                return Err(CompError::not_found("target", target_key(*employee_id, period)));
            }
            store.delete_target(*employee_id, period)?;
            Ok(vec![CompEvent::TargetRemoved { seq, employee_id: *employee_id, period }])
        }

        Command::SignProject(project) => sign_project(store, seq, project),

        Command::UpdateProject { project_id, changes } => {
            update_project(store, seq, *project_id, changes)
        }

        Command::RemoveProject { project_id } => {
            let project = require_project(store, *project_id)?;
            store.delete_project(*project_id)?;
            Ok(vec![CompEvent::ProjectRemoved {
                seq,
                project_id: *project_id,
                employee_id: project.employee_id,
                period: project.period,
                was_social: project.is_from_social_media,
            }])
        }

        Command::RerateProject { project_id } => {
            require_project(store, *project_id)?;
            Ok(vec![CompEvent::ProjectRerateRequested { seq, project_id: *project_id }])
        }

        Command::CreateMarketingBudget { period, total_budget, created_by } => {
            let period = period.validated()?;
            if store.get_budget(period)?.is_some() {
                return Err(CompError::duplicate("marketing budget", period));
            }
            set_budget(store, seq, period, *total_budget, *created_by)
        }

        Command::SetMarketingBudget { period, total_budget, created_by } => {
            let period = period.validated()?;
            set_budget(store, seq, period, *total_budget, *created_by)
        }

        Command::ReallocateMarketing { period } => {
            let period = period.validated()?;
            Ok(vec![CompEvent::ReallocationRequested { seq, period }])
        }

        Command::CreateKpi { name, description, weight, max_score } => {
            require_name("kpi name", name)?;
            require_weight(*weight)?;
            require_positive("max_score", *max_score)?;
            let kpi_id = store.insert_kpi(name.trim(), description.as_deref(), *weight, *max_score)?;
            Ok(vec![CompEvent::KpiCreated {
                seq,
                kpi_id,
                weight: *weight,
                max_score: *max_score,
            }])
        }

        Command::UpdateKpi { kpi_id, changes } => update_kpi(store, seq, *kpi_id, changes),

        Command::DeactivateKpi { kpi_id } => {
            require_kpi(store, *kpi_id)?;
            store.deactivate_kpi(*kpi_id)?;
            Ok(vec![CompEvent::KpiDeactivated { seq, kpi_id: *kpi_id }])
        }

        Command::RecordScore { employee_id, kpi_id, period, score, notes } => {
            let period = period.validated()?;
            require_employee(store, *employee_id)?;
            let kpi = require_kpi(store, *kpi_id)?;
            if !kpi.is_active {
                return Err(CompError::InvalidInput(format!("kpi {kpi_id} is inactive")));
            }
            if !score.is_finite() || *score < 0.0 || *score > kpi.max_score {
                return Err(CompError::InvalidInput(format!(
                    "score must be within [0, {}], got {score}",
                    kpi.max_score
                )));
            }
            let row = ScoreRow {
                employee_id: *employee_id,
                kpi_id: *kpi_id,
                period,
                score: *score,
                weighted_score: score * kpi.weight,
                notes: notes.clone(),
            };
            store.upsert_score(&row, seq)?;
            Ok(vec![CompEvent::ScoreRecorded {
                seq,
                employee_id: row.employee_id,
                kpi_id: row.kpi_id,
                period,
                score: row.score,
                weighted_score: row.weighted_score,
            }])
        }

        Command::CalculateCommissions { period, employee_ids } => {
            let period = period.validated()?;
            let ids = if employee_ids.is_empty() {
                store.active_employee_ids()?
            } else {
                for id in employee_ids {
                    require_employee(store, *id)?;
                }
                // One snapshot per employee, in first-listed order.
                let mut seen = BTreeSet::new();
                let mut ids = employee_ids.clone();
                ids.retain(|id| seen.insert(*id));
                ids
            };
            Ok(ids
                .into_iter()
                .map(|employee_id| CompEvent::CommissionRequested { seq, employee_id, period })
                .collect())
        }

        Command::ApproveCommission { employee_id, period, approver_id } => {
            let period = period.validated()?;
            require_employee(store, *approver_id)?;
            if store.get_commission(*employee_id, period)?.is_none() {
                return Err(CompError::not_found("commission", target_key(*employee_id, period)));
            }
            store.approve_commission(*employee_id, period, *approver_id, seq)?;
            Ok(vec![CompEvent::CommissionApproved {
                seq,
                employee_id: *employee_id,
                period,
                approver_id: *approver_id,
            }])
        }
    }
}

fn update_employee(
    store: &CompStore,
    seq: Seq,
    employee_id: EmployeeId,
    changes: &EmployeeChanges,
) -> CompResult<Vec<CompEvent>> {
    let mut employee = require_employee(store, employee_id)?;
    if let Some(name) = &changes.name {
        require_name("employee name", name)?;
        employee.name = name.trim().to_string();
    }
    if let Some(role) = changes.role {
        employee.role = role;
    }
    if let Some(base_salary) = changes.base_salary {
        require_non_negative("base_salary", base_salary)?;
        employee.base_salary = base_salary;
    }
    match changes.team_id {
        Some(Some(team_id)) => {
            require_team(store, team_id)?;
            employee.team_id = Some(team_id);
        }
        Some(None) => employee.team_id = None,
        None => {}
    }
    if let Some(is_active) = changes.is_active {
        employee.is_active = is_active;
    }
    store.update_employee(&employee, seq)?;
    Ok(vec![CompEvent::EmployeeUpdated { seq, employee_id }])
}

/// Refused while the employee owns projects or has a commission
/// snapshot. Targets and scores go with the employee; references from
/// teams, budgets and approvals are cleared.
fn remove_employee(
    store: &CompStore,
    seq: Seq,
    employee_id: EmployeeId,
) -> CompResult<Vec<CompEvent>> {
    require_employee(store, employee_id)?;
    let projects = store.project_count_for(employee_id)?;
    if projects > 0 {
        return Err(CompError::in_use("employee", employee_id, format!("{projects} project(s)")));
    }
    let snapshots = store.commission_count_for(employee_id)?;
    if snapshots > 0 {
        return Err(CompError::in_use(
            "employee",
            employee_id,
            format!("{snapshots} commission snapshot(s)"),
        ));
    }
    store.delete_employee(employee_id)?;
    Ok(vec![CompEvent::EmployeeRemoved { seq, employee_id }])
}

fn update_team(
    store: &CompStore,
    seq: Seq,
    team_id: TeamId,
    changes: &TeamChanges,
) -> CompResult<Vec<CompEvent>> {
    let mut team = require_team(store, team_id)?;
    if let Some(name) = &changes.name {
        require_name("team name", name)?;
        team.name = name.trim().to_string();
    }
    if let Some(leader_id) = changes.leader_id {
        if let Some(leader_id) = leader_id {
            require_employee(store, leader_id)?;
        }
        team.leader_id = leader_id;
    }
    store.update_team(&team)?;
    Ok(vec![CompEvent::TeamUpdated { seq, team_id, leader_id: team.leader_id }])
}

/// A weight change rewrites `weighted_score` on every recorded score of
/// the KPI. Commission snapshots keep their figures until recalculated.
fn update_kpi(
    store: &CompStore,
    seq: Seq,
    kpi_id: KpiId,
    changes: &KpiChanges,
) -> CompResult<Vec<CompEvent>> {
    let mut kpi = require_kpi(store, kpi_id)?;
    let old_weight = kpi.weight;
    if let Some(name) = &changes.name {
        require_name("kpi name", name)?;
        kpi.name = name.trim().to_string();
    }
    if changes.description.is_some() {
        kpi.description = changes.description.clone();
    }
    if let Some(weight) = changes.weight {
        require_weight(weight)?;
        kpi.weight = weight;
    }
    if let Some(max_score) = changes.max_score {
        require_positive("max_score", max_score)?;
        if let Some(highest) = store.highest_score(kpi_id)? {
            if highest > max_score {
                return Err(CompError::InvalidInput(format!(
                    "max_score {max_score} is below recorded score {highest} for kpi {kpi_id}"
                )));
            }
        }
        kpi.max_score = max_score;
    }
    store.update_kpi(&kpi)?;

    let rescored = if kpi.weight != old_weight {
        store.reweight_scores(kpi_id, kpi.weight, seq)?
    } else {
        0
    };
    Ok(vec![CompEvent::KpiUpdated {
        seq,
        kpi_id,
        weight: kpi.weight,
        max_score: kpi.max_score,
        rescored,
    }])
}

fn sign_project(store: &CompStore, seq: Seq, p: &NewProject) -> CompResult<Vec<CompEvent>> {
    require_employee(store, p.employee_id)?;
    require_name("client_name", &p.client_name)?;
    require_name("product_type", &p.product_type)?;
    require_positive("project_value", p.project_value)?;

    let project_id = store.insert_project(p, seq)?;
    Ok(vec![CompEvent::ProjectSigned {
        seq,
        project_id,
        employee_id: p.employee_id,
        period: Period::of(p.signature_date),
        project_value: p.project_value,
        is_from_social_media: p.is_from_social_media,
    }])
}

/// Apply a partial edit. The rate is left alone but raw commission is
/// recomputed from the new value. A project that was social drops its
/// allocation here and picks up a fresh one when its period is reallocated.
fn update_project(
    store: &CompStore,
    seq: Seq,
    project_id: ProjectId,
    changes: &ProjectChanges,
) -> CompResult<Vec<CompEvent>> {
    let before = require_project(store, project_id)?;
    let mut project = before.clone();

    if let Some(client_name) = &changes.client_name {
        require_name("client_name", client_name)?;
        project.client_name = client_name.clone();
    }
    if let Some(project_value) = changes.project_value {
        require_positive("project_value", project_value)?;
        project.project_value = project_value;
    }
    if let Some(product_type) = &changes.product_type {
        require_name("product_type", product_type)?;
        project.product_type = product_type.clone();
    }
    if let Some(signature_date) = changes.signature_date {
        project.signature_date = signature_date;
    }
    if let Some(social) = changes.is_from_social_media {
        project.is_from_social_media = social;
    }
    if changes.notes.is_some() {
        project.notes = changes.notes.clone();
    }

    // The rate stays; raw follows the current value.
    let raw_commission = project.project_value * before.commission_rate;
    if raw_commission != before.raw_commission {
        store.update_project_commission(
            project_id,
            before.commission_rate,
            raw_commission,
            net_commission(raw_commission, before.marketing_cost_allocated),
            seq,
        )?;
    }
    if before.is_from_social_media && before.marketing_cost_allocated != 0.0 {
        store.update_project_allocation(
            project_id,
            0.0,
            net_commission(raw_commission, 0.0),
            seq,
        )?;
    }
    store.update_project_facts(&project, seq)?;

    Ok(vec![CompEvent::ProjectChanged {
        seq,
        project_id,
        employee_id: project.employee_id,
        before: before.period,
        after: Period::of(project.signature_date),
        was_social: before.is_from_social_media,
        is_social: project.is_from_social_media,
    }])
}

fn set_budget(
    store: &CompStore,
    seq: Seq,
    period: Period,
    total_budget: f64,
    created_by: Option<EmployeeId>,
) -> CompResult<Vec<CompEvent>> {
    require_non_negative("total_budget", total_budget)?;
    if let Some(creator) = created_by {
        require_employee(store, creator)?;
    }
    store.upsert_budget(period, total_budget, created_by, seq)?;
    Ok(vec![CompEvent::BudgetSet { seq, period, total_budget }])
}

// ── Validation helpers ─────────────────────────────────────────

fn target_key(employee_id: EmployeeId, period: Period) -> String {
    format!("employee {employee_id} {period}")
}

fn require_name(field: &str, value: &str) -> CompResult<()> {
    if value.trim().is_empty() {
        return Err(CompError::InvalidInput(format!("{field} must not be blank")));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> CompResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CompError::InvalidInput(format!("{field} must be >= 0, got {value}")));
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> CompResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CompError::InvalidInput(format!("{field} must be > 0, got {value}")));
    }
    Ok(())
}

fn require_weight(weight: f64) -> CompResult<()> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(CompError::InvalidInput(format!(
            "kpi weight must be within [0, 1], got {weight}"
        )));
    }
    Ok(())
}

fn require_employee(store: &CompStore, employee_id: EmployeeId) -> CompResult<EmployeeRow> {
    store
        .get_employee(employee_id)?
        .ok_or_else(|| CompError::not_found("employee", employee_id))
}

fn require_team(store: &CompStore, team_id: TeamId) -> CompResult<TeamRow> {
    store
        .get_team(team_id)?
        .ok_or_else(|| CompError::not_found("team", team_id))
}

fn require_project(store: &CompStore, project_id: ProjectId) -> CompResult<ProjectRow> {
    store
        .get_project(project_id)?
        .ok_or_else(|| CompError::not_found("project", project_id))
}

fn require_kpi(store: &CompStore, kpi_id: KpiId) -> CompResult<KpiRow> {
    store
        .get_kpi(kpi_id)?
        .ok_or_else(|| CompError::not_found("kpi", kpi_id))
}
