//! The event stream: everything a command caused, in order.
//!
//! RULE: Components communicate ONLY through events.
//! A component never drives another component; shared calculators
//! (achievement ratio, allocation shares) are plain functions.
//! Every event is persisted to event_log in the command's transaction.

use crate::types::{EmployeeId, KpiId, Period, ProjectId, Role, Seq, TeamId};
use serde::{Deserialize, Serialize};

/// Every event emitted while applying a command.
/// Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompEvent {
    // ── Intake: externally authored facts ──────────
    EmployeeRegistered {
        seq: Seq,
        employee_id: EmployeeId,
        role: Role,
        base_salary: f64,
    },
    EmployeeUpdated {
        seq: Seq,
        employee_id: EmployeeId,
    },
    TeamCreated {
        seq: Seq,
        team_id: TeamId,
        leader_id: Option<EmployeeId>,
    },
    TargetSet {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
        target_amount: f64,
    },
    TargetAmountChanged {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
        old_amount: f64,
        new_amount: f64,
    },
    TargetRefreshRequested {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
    },
    ProjectSigned {
        seq: Seq,
        project_id: ProjectId,
        employee_id: EmployeeId,
        period: Period,
        project_value: f64,
        is_from_social_media: bool,
    },
    ProjectChanged {
        seq: Seq,
        project_id: ProjectId,
        employee_id: EmployeeId,
        before: Period,
        after: Period,
        was_social: bool,
        is_social: bool,
    },
    ProjectRemoved {
        seq: Seq,
        project_id: ProjectId,
        employee_id: EmployeeId,
        period: Period,
        was_social: bool,
    },
    ProjectRerateRequested {
        seq: Seq,
        project_id: ProjectId,
    },
    BudgetSet {
        seq: Seq,
        period: Period,
        total_budget: f64,
    },
    ReallocationRequested {
        seq: Seq,
        period: Period,
    },
    KpiCreated {
        seq: Seq,
        kpi_id: KpiId,
        weight: f64,
        max_score: f64,
    },
    KpiDeactivated {
        seq: Seq,
        kpi_id: KpiId,
    },
    ScoreRecorded {
        seq: Seq,
        employee_id: EmployeeId,
        kpi_id: KpiId,
        period: Period,
        score: f64,
        weighted_score: f64,
    },
    CommissionRequested {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
    },
    CommissionApproved {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
        approver_id: EmployeeId,
    },
    EmployeeRemoved {
        seq: Seq,
        employee_id: EmployeeId,
    },
    TeamUpdated {
        seq: Seq,
        team_id: TeamId,
        leader_id: Option<EmployeeId>,
    },
    TeamRemoved {
        seq: Seq,
        team_id: TeamId,
    },
    TargetRemoved {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
    },
    KpiUpdated {
        seq: Seq,
        kpi_id: KpiId,
        weight: f64,
        max_score: f64,
        rescored: usize,
    },

    // ── Project commission ─────────────────────────
    ProjectRated {
        seq: Seq,
        project_id: ProjectId,
        employee_id: EmployeeId,
        period: Period,
        achievement_ratio: f64,
        commission_rate: f64,
        raw_commission: f64,
        is_from_social_media: bool,
    },

    // ── Achievement ────────────────────────────────
    TargetRefreshed {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
        achieved_amount: f64,
        achievement_percentage: f64,
    },

    // ── Marketing allocation ───────────────────────
    ProjectCostAllocated {
        seq: Seq,
        project_id: ProjectId,
        period: Period,
        share: f64,
        allocated: f64,
        final_commission: f64,
    },
    MarketingReallocated {
        seq: Seq,
        period: Period,
        total_budget: f64,
        total_social_value: f64,
        project_count: usize,
        allocated_total: f64,
    },
    MarketingAllocationSkipped {
        seq: Seq,
        period: Period,
        reason: AllocationSkip,
    },

    // ── Commission aggregation ─────────────────────
    CommissionCalculated {
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
        base_commission: f64,
        marketing_deduction: f64,
        performance_bonus: f64,
        final_commission: f64,
        total_salary: f64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllocationSkip {
    NoSocialProjects,
    NoBudget,
    ZeroSocialValue,
}

impl CompEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            CompEvent::EmployeeRegistered { .. }         => "employee_registered",
            CompEvent::EmployeeUpdated { .. }            => "employee_updated",
            CompEvent::TeamCreated { .. }                => "team_created",
            CompEvent::TargetSet { .. }                  => "target_set",
            CompEvent::TargetAmountChanged { .. }        => "target_amount_changed",
            CompEvent::TargetRefreshRequested { .. }     => "target_refresh_requested",
            CompEvent::ProjectSigned { .. }              => "project_signed",
            CompEvent::ProjectChanged { .. }             => "project_changed",
            CompEvent::ProjectRemoved { .. }             => "project_removed",
            CompEvent::ProjectRerateRequested { .. }     => "project_rerate_requested",
            CompEvent::BudgetSet { .. }                  => "budget_set",
            CompEvent::ReallocationRequested { .. }      => "reallocation_requested",
            CompEvent::KpiCreated { .. }                 => "kpi_created",
            CompEvent::KpiDeactivated { .. }             => "kpi_deactivated",
            CompEvent::ScoreRecorded { .. }              => "score_recorded",
            CompEvent::CommissionRequested { .. }        => "commission_requested",
            CompEvent::CommissionApproved { .. }         => "commission_approved",
            CompEvent::EmployeeRemoved { .. }            => "employee_removed",
            CompEvent::TeamUpdated { .. }                => "team_updated",
            CompEvent::TeamRemoved { .. }                => "team_removed",
            CompEvent::TargetRemoved { .. }              => "target_removed",
            CompEvent::KpiUpdated { .. }                 => "kpi_updated",
            CompEvent::ProjectRated { .. }               => "project_rated",
            CompEvent::TargetRefreshed { .. }            => "target_refreshed",
            CompEvent::ProjectCostAllocated { .. }       => "project_cost_allocated",
            CompEvent::MarketingReallocated { .. }       => "marketing_reallocated",
            CompEvent::MarketingAllocationSkipped { .. } => "marketing_allocation_skipped",
            CompEvent::CommissionCalculated { .. }       => "commission_calculated",
        }
    }
}

/// A persisted event log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub seq:        Seq,
    pub op_id:      String,
    pub component:  String,
    pub event_type: String,
    pub payload:    String,
}
