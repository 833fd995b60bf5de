use crate::types::{EmployeeId, KpiId, Period, ProjectId, Role, TeamId};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Every mutation the engine accepts.
/// Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    // ── Organisation ──────────────────────────────
    RegisterEmployee {
        name:        String,
        role:        Role,
        base_salary: f64,
        #[serde(default)]
        team_id:     Option<TeamId>,
    },
    UpdateEmployee {
        employee_id: EmployeeId,
        changes:     EmployeeChanges,
    },
    /// Refused while the employee still owns projects.
    RemoveEmployee {
        employee_id: EmployeeId,
    },
    CreateTeam {
        name:      String,
        #[serde(default)]
        leader_id: Option<EmployeeId>,
    },
    UpdateTeam {
        team_id: TeamId,
        changes: TeamChanges,
    },
    /// Refused while the team still has members.
    RemoveTeam {
        team_id: TeamId,
    },

    // ── Targets ───────────────────────────────────
    SetTarget {
        employee_id:   EmployeeId,
        period:        Period,
        target_amount: f64,
    },
    UpdateTargetAmount {
        employee_id:   EmployeeId,
        period:        Period,
        target_amount: f64,
    },
    RefreshTarget {
        employee_id: EmployeeId,
        period:      Period,
    },
    RemoveTarget {
        employee_id: EmployeeId,
        period:      Period,
    },

    // ── Projects ──────────────────────────────────
    SignProject(NewProject),
    UpdateProject {
        project_id: ProjectId,
        changes:    ProjectChanges,
    },
    RemoveProject {
        project_id: ProjectId,
    },
    RerateProject {
        project_id: ProjectId,
    },

    // ── Marketing ─────────────────────────────────
    CreateMarketingBudget {
        period:       Period,
        total_budget: f64,
        #[serde(default)]
        created_by:   Option<EmployeeId>,
    },
    SetMarketingBudget {
        period:       Period,
        total_budget: f64,
        #[serde(default)]
        created_by:   Option<EmployeeId>,
    },
    ReallocateMarketing {
        period: Period,
    },

    // ── Performance ───────────────────────────────
    CreateKpi {
        name:        String,
        #[serde(default)]
        description: Option<String>,
        weight:      f64,
        #[serde(default = "default_max_score")]
        max_score:   f64,
    },
    UpdateKpi {
        kpi_id:  KpiId,
        changes: KpiChanges,
    },
    DeactivateKpi {
        kpi_id: KpiId,
    },
    RecordScore {
        employee_id: EmployeeId,
        kpi_id:      KpiId,
        period:      Period,
        score:       f64,
        #[serde(default)]
        notes:       Option<String>,
    },

    // ── Commission ────────────────────────────────
    /// Empty `employee_ids` means every active employee.
    CalculateCommissions {
        period:       Period,
        #[serde(default)]
        employee_ids: Vec<EmployeeId>,
    },
    ApproveCommission {
        employee_id: EmployeeId,
        period:      Period,
        approver_id: EmployeeId,
    },
}

fn default_max_score() -> f64 {
    10.0
}

impl Command {
    pub fn type_name(&self) -> &'static str {
        match self {
            Command::RegisterEmployee { .. }      => "register_employee",
            Command::UpdateEmployee { .. }        => "update_employee",
            Command::RemoveEmployee { .. }        => "remove_employee",
            Command::CreateTeam { .. }            => "create_team",
            Command::UpdateTeam { .. }            => "update_team",
            Command::RemoveTeam { .. }            => "remove_team",
            Command::SetTarget { .. }             => "set_target",
            Command::UpdateTargetAmount { .. }    => "update_target_amount",
            Command::RefreshTarget { .. }         => "refresh_target",
            Command::RemoveTarget { .. }          => "remove_target",
            Command::SignProject(_)               => "sign_project",
            Command::UpdateProject { .. }         => "update_project",
            Command::RemoveProject { .. }         => "remove_project",
            Command::RerateProject { .. }         => "rerate_project",
            Command::CreateMarketingBudget { .. } => "create_marketing_budget",
            Command::SetMarketingBudget { .. }    => "set_marketing_budget",
            Command::ReallocateMarketing { .. }   => "reallocate_marketing",
            Command::CreateKpi { .. }             => "create_kpi",
            Command::UpdateKpi { .. }             => "update_kpi",
            Command::DeactivateKpi { .. }         => "deactivate_kpi",
            Command::RecordScore { .. }           => "record_score",
            Command::CalculateCommissions { .. }  => "calculate_commissions",
            Command::ApproveCommission { .. }     => "approve_commission",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub employee_id:          EmployeeId,
    pub client_name:          String,
    pub project_value:        f64,
    pub product_type:         String,
    pub signature_date:       NaiveDate,
    #[serde(default)]
    pub is_from_social_media: bool,
    #[serde(default)]
    pub notes:                Option<String>,
}

/// Partial update; `None` leaves the field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectChanges {
    pub client_name:          Option<String>,
    pub project_value:        Option<f64>,
    pub product_type:         Option<String>,
    pub signature_date:       Option<NaiveDate>,
    pub is_from_social_media: Option<bool>,
    pub notes:                Option<String>,
}

/// `team_id`: absent leaves the team as is, `null` removes the employee
/// from their team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeChanges {
    pub name:        Option<String>,
    pub role:        Option<Role>,
    pub base_salary: Option<f64>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub team_id:     Option<Option<TeamId>>,
    pub is_active:   Option<bool>,
}

/// `leader_id`: absent leaves the leader as is, `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamChanges {
    pub name:      Option<String>,
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<Option<EmployeeId>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiChanges {
    pub name:        Option<String>,
    pub description: Option<String>,
    pub weight:      Option<f64>,
    pub max_score:   Option<f64>,
}

/// Present-but-null becomes `Some(None)`; a missing field stays `None`
/// through `#[serde(default)]`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
