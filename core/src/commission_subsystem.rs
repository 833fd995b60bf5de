//! Commission aggregation subsystem: one snapshot per employee per month.
//!
//! Sums the net commission of the employee's projects, reports the
//! marketing deduction already netted into it, and adds the performance
//! bonus from weighted KPI scores. Always recomputed from source rows;
//! the snapshot is upserted, never accumulated.

use crate::{
    config::CompConfig,
    error::{CompError, CompResult},
    event::CompEvent,
    store::{CommissionRow, CompStore},
    subsystem::CompSubsystem,
    types::{EmployeeId, Period, Seq},
};

pub struct CommissionSubsystem {
    bonus_per_point: f64,
}

impl CommissionSubsystem {
    pub fn new(config: &CompConfig) -> Self {
        Self { bonus_per_point: config.policy.performance_bonus_per_point }
    }

    /// Compute and persist the snapshot for one employee's period.
    pub fn calculate(
        &self,
        store: &CompStore,
        seq: Seq,
        employee_id: EmployeeId,
        period: Period,
    ) -> CompResult<CommissionRow> {
        let employee = store
            .get_employee(employee_id)?
            .ok_or_else(|| CompError::not_found("employee", employee_id))?;

        let totals = store.employee_project_totals(employee_id, period)?;
        let weighted = store.sum_weighted_scores(employee_id, period)?;

        let base_commission = totals.final_commission;
        let performance_bonus = weighted * self.bonus_per_point;
        let final_commission = base_commission + performance_bonus;

        let row = CommissionRow {
            employee_id,
            period,
            base_commission,
            marketing_deduction: totals.marketing_cost_allocated,
            performance_bonus,
            final_commission,
            total_salary: employee.base_salary + final_commission,
            is_approved: false,
            approved_by: None,
            approved_seq: None,
            updated_seq: seq,
        };
        store.upsert_commission(&row)?;
        Ok(row)
    }
}

impl CompSubsystem for CommissionSubsystem {
    fn name(&self) -> &'static str { "commission" }

    fn update(
        &mut self,
        seq: Seq,
        store: &CompStore,
        events_in: &[CompEvent],
    ) -> CompResult<Vec<CompEvent>> {
        let mut out_events = Vec::new();

        for event in events_in {
            let CompEvent::CommissionRequested { employee_id, period, .. } = event else {
                continue;
            };
            let row = self.calculate(store, seq, *employee_id, *period)?;

            log::info!(
                "seq={seq} commission: employee {employee_id} {period} base {:.2} + bonus {:.2} = {:.2} (total salary {:.2})",
                row.base_commission,
                row.performance_bonus,
                row.final_commission,
                row.total_salary
            );

            out_events.push(CompEvent::CommissionCalculated {
                seq,
                employee_id: row.employee_id,
                period: row.period,
                base_commission: row.base_commission,
                marketing_deduction: row.marketing_deduction,
                performance_bonus: row.performance_bonus,
                final_commission: row.final_commission,
                total_salary: row.total_salary,
            });
        }

        Ok(out_events)
    }
}
