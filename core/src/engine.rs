//! The compensation engine: applies one command at a time.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Intake                  (validates the command, records its facts)
//!   1. Project commission      (rates newly signed or rerated projects)
//!   2. Achievement             (refreshes target progress)
//!   3. Marketing allocation    (redistributes budgets over social projects)
//!   4. Commission aggregation  (writes per-employee monthly snapshots)
//!
//! RULES:
//!   - Components execute in registration order, once per command.
//!   - Each component sees every event emitted so far for the command.
//!   - No component calls another component.
//!   - A command is one transaction: every row and event it produced
//!     is committed together, or none is.
//!   - All state changes are recorded in the event log.

use crate::{
    achievement_subsystem::AchievementSubsystem,
    clock::LedgerClock,
    command::{Command, NewProject},
    commission_subsystem::CommissionSubsystem,
    config::CompConfig,
    error::{CompError, CompResult},
    event::{CompEvent, EventLogEntry},
    intake,
    marketing_subsystem::MarketingSubsystem,
    project_subsystem::ProjectCommissionSubsystem,
    store::{CommissionRow, CompStore, ProjectRow},
    subsystem::CompSubsystem,
    types::{EmployeeId, KpiId, Period, Role, Seq, TeamId},
};
use uuid::Uuid;

pub struct CompEngine {
    pub clock:  LedgerClock,
    config:     CompConfig,
    subsystems: Vec<Box<dyn CompSubsystem>>,
    store:      CompStore,
}

impl CompEngine {
    /// Engine with no components registered. Resumes the sequence from
    /// whatever the store already holds.
    pub fn new(store: CompStore, config: CompConfig) -> CompResult<Self> {
        let clock = LedgerClock::resume_at(store.last_seq()?);
        Ok(Self {
            clock,
            config,
            subsystems: Vec::new(),
            store,
        })
    }

    /// Build a fully wired engine with all components registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(store: CompStore, config: CompConfig) -> CompResult<Self> {
        let mut engine = CompEngine::new(store, config)?;

        // EXECUTION ORDER: fixed, documented, never reordered.
        let project = ProjectCommissionSubsystem::new(&engine.config);
        let commission = CommissionSubsystem::new(&engine.config);
        engine.register(Box::new(project));
        engine.register(Box::new(AchievementSubsystem::new()));
        engine.register(Box::new(MarketingSubsystem::new()));
        engine.register(Box::new(commission));
        Ok(engine)
    }

    /// Fully wired engine over a fresh in-memory store and the default
    /// test configuration.
    pub fn build_test() -> CompResult<Self> {
        let store = CompStore::in_memory()?;
        store.migrate()?;
        Self::build(store, CompConfig::default_test())
    }

    /// Register a component. Call in the documented execution order.
    pub fn register(&mut self, subsystem: Box<dyn CompSubsystem>) {
        self.subsystems.push(subsystem);
    }

    pub fn store(&self) -> &CompStore {
        &self.store
    }

    pub fn config(&self) -> &CompConfig {
        &self.config
    }

    /// Apply one command. This is the core engine step.
    /// Returns every event the command produced, in emission order.
    pub fn execute(&mut self, command: Command) -> CompResult<Vec<CompEvent>> {
        let seq = self.clock.next_seq();
        let op_id = Uuid::new_v4().to_string();

        let store = &self.store;
        let subsystems = &mut self.subsystems;
        let result = store.in_transaction(|store| {
            let mut events = intake::apply(store, seq, &command)?;
            record(store, seq, &op_id, "intake", &events)?;

            // Each component sees all events emitted so far for this command.
            for subsystem in subsystems.iter_mut() {
                let new_events = subsystem.update(seq, store, &events)?;
                record(store, seq, &op_id, subsystem.name(), &new_events)?;
                events.extend(new_events);
            }
            Ok(events)
        });

        match result {
            Ok(events) => {
                self.clock.commit(seq);
                log::debug!(
                    "seq={seq} engine: {} committed with {} event(s)",
                    command.type_name(),
                    events.len()
                );
                Ok(events)
            }
            Err(e) => {
                log::warn!("seq={seq} engine: {} rejected: {e}", command.type_name());
                Err(e)
            }
        }
    }

    /// Events committed under `seq`, in emission order.
    pub fn events_for_seq(&self, seq: Seq) -> CompResult<Vec<EventLogEntry>> {
        self.store.events_for_seq(seq)
    }

    // ── Typed helpers ──────────────────────────────────────────

    pub fn register_employee(
        &mut self,
        name: &str,
        role: Role,
        base_salary: f64,
        team_id: Option<TeamId>,
    ) -> CompResult<EmployeeId> {
        let events = self.execute(Command::RegisterEmployee {
            name: name.to_string(),
            role,
            base_salary,
            team_id,
        })?;
        events
            .iter()
            .find_map(|e| match e {
                CompEvent::EmployeeRegistered { employee_id, .. } => Some(*employee_id),
                _ => None,
            })
            .ok_or_else(|| missing_event("employee_registered"))
    }

    pub fn create_team(&mut self, name: &str, leader_id: Option<EmployeeId>) -> CompResult<TeamId> {
        let events = self.execute(Command::CreateTeam { name: name.to_string(), leader_id })?;
        events
            .iter()
            .find_map(|e| match e {
                CompEvent::TeamCreated { team_id, .. } => Some(*team_id),
                _ => None,
            })
            .ok_or_else(|| missing_event("team_created"))
    }

    pub fn set_target(
        &mut self,
        employee_id: EmployeeId,
        period: Period,
        target_amount: f64,
    ) -> CompResult<()> {
        self.execute(Command::SetTarget { employee_id, period, target_amount })?;
        Ok(())
    }

    /// Sign a project and return it as stored after rating and allocation.
    pub fn sign_project(&mut self, project: NewProject) -> CompResult<ProjectRow> {
        let events = self.execute(Command::SignProject(project))?;
        let project_id = events
            .iter()
            .find_map(|e| match e {
                CompEvent::ProjectSigned { project_id, .. } => Some(*project_id),
                _ => None,
            })
            .ok_or_else(|| missing_event("project_signed"))?;
        self.store
            .get_project(project_id)?
            .ok_or_else(|| CompError::not_found("project", project_id))
    }

    pub fn set_marketing_budget(&mut self, period: Period, total_budget: f64) -> CompResult<()> {
        self.execute(Command::SetMarketingBudget { period, total_budget, created_by: None })?;
        Ok(())
    }

    pub fn create_kpi(&mut self, name: &str, weight: f64, max_score: f64) -> CompResult<KpiId> {
        let events = self.execute(Command::CreateKpi {
            name: name.to_string(),
            description: None,
            weight,
            max_score,
        })?;
        events
            .iter()
            .find_map(|e| match e {
                CompEvent::KpiCreated { kpi_id, .. } => Some(*kpi_id),
                _ => None,
            })
            .ok_or_else(|| missing_event("kpi_created"))
    }

    pub fn record_score(
        &mut self,
        employee_id: EmployeeId,
        kpi_id: KpiId,
        period: Period,
        score: f64,
    ) -> CompResult<()> {
        self.execute(Command::RecordScore { employee_id, kpi_id, period, score, notes: None })?;
        Ok(())
    }

    pub fn calculate_employee_commission(
        &mut self,
        employee_id: EmployeeId,
        period: Period,
    ) -> CompResult<CommissionRow> {
        self.execute(Command::CalculateCommissions { period, employee_ids: vec![employee_id] })?;
        self.store
            .get_commission(employee_id, period)?
            .ok_or_else(|| CompError::not_found("commission", employee_id))
    }

    /// Batch mode. An empty `employee_ids` covers every active employee.
    pub fn calculate_commissions(
        &mut self,
        period: Period,
        employee_ids: Vec<EmployeeId>,
    ) -> CompResult<Vec<CommissionRow>> {
        let events = self.execute(Command::CalculateCommissions { period, employee_ids })?;
        let mut rows = Vec::new();
        for event in &events {
            if let CompEvent::CommissionCalculated { employee_id, .. } = event {
                let row = self
                    .store
                    .get_commission(*employee_id, period)?
                    .ok_or_else(|| CompError::not_found("commission", *employee_id))?;
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

/// Persist `events` to the event log under `component`.
fn record(
    store: &CompStore,
    seq: Seq,
    op_id: &str,
    component: &str,
    events: &[CompEvent],
) -> CompResult<()> {
    for event in events {
        let entry = EventLogEntry {
            id:         None,
            seq,
            op_id:      op_id.to_string(),
            component:  component.to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        store.append_event(&entry)?;
    }
    Ok(())
}

fn missing_event(kind: &str) -> CompError {
    CompError::Other(anyhow::anyhow!("command committed without a {kind} event"))
}
