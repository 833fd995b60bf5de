//! Achievement subsystem: keeps each Target's progress in step with
//! the projects signed against it.
//!
//! Reacts to any event that changes an employee's signed value or
//! target for a period, and rewrites achieved_amount and
//! achievement_percentage from a fresh sum. Never increments.

use crate::{
    error::CompResult,
    event::CompEvent,
    store::{CompStore, TargetRow},
    subsystem::CompSubsystem,
    types::{EmployeeId, Period, Seq},
};
use std::collections::BTreeSet;

/// Signed value over target. A zero target yields 0, never an error.
pub fn achievement_ratio(achieved: f64, target_amount: f64) -> f64 {
    if target_amount > 0.0 {
        achieved / target_amount
    } else {
        0.0
    }
}

/// Achievement ratio for an employee's period, counting every project
/// currently stored for it. No target means ratio 0.
pub fn compute_achievement(
    store: &CompStore,
    employee_id: EmployeeId,
    period: Period,
) -> CompResult<f64> {
    let Some(target) = store.get_target(employee_id, period)? else {
        return Ok(0.0);
    };
    let achieved = store.sum_project_value(employee_id, period)?;
    Ok(achievement_ratio(achieved, target.target_amount))
}

/// Recompute and persist a target's progress. Returns None when the
/// employee has no target for the period.
pub fn refresh_target(
    store: &CompStore,
    employee_id: EmployeeId,
    period: Period,
    seq: Seq,
) -> CompResult<Option<TargetRow>> {
    let Some(mut target) = store.get_target(employee_id, period)? else {
        return Ok(None);
    };
    let achieved = store.sum_project_value(employee_id, period)?;
    target.achieved_amount = achieved;
    target.achievement_percentage = achievement_ratio(achieved, target.target_amount);
    target.updated_seq = seq;
    store.upsert_target(&target)?;
    Ok(Some(target))
}

#[derive(Default)]
pub struct AchievementSubsystem;

impl AchievementSubsystem {
    pub fn new() -> Self {
        Self
    }

    /// (employee, period) pairs whose signed value or target moved.
    fn affected(events_in: &[CompEvent]) -> BTreeSet<(EmployeeId, Period)> {
        let mut keys = BTreeSet::new();
        for event in events_in {
            match event {
                CompEvent::ProjectSigned { employee_id, period, .. }
                | CompEvent::ProjectRemoved { employee_id, period, .. }
                | CompEvent::TargetSet { employee_id, period, .. }
                | CompEvent::TargetAmountChanged { employee_id, period, .. }
                | CompEvent::TargetRefreshRequested { employee_id, period, .. } => {
                    keys.insert((*employee_id, *period));
                }
                CompEvent::ProjectChanged { employee_id, before, after, .. } => {
                    keys.insert((*employee_id, *before));
                    keys.insert((*employee_id, *after));
                }
                _ => {}
            }
        }
        keys
    }
}

impl CompSubsystem for AchievementSubsystem {
    fn name(&self) -> &'static str { "achievement" }

    fn update(
        &mut self,
        seq: Seq,
        store: &CompStore,
        events_in: &[CompEvent],
    ) -> CompResult<Vec<CompEvent>> {
        let mut out_events = Vec::new();

        for (employee_id, period) in Self::affected(events_in) {
            match refresh_target(store, employee_id, period, seq)? {
                Some(target) => {
                    log::debug!(
                        "seq={seq} achievement: employee {employee_id} {period} at {:.1}% ({:.2} of {:.2})",
                        target.achievement_percentage * 100.0,
                        target.achieved_amount,
                        target.target_amount
                    );
                    out_events.push(CompEvent::TargetRefreshed {
                        seq,
                        employee_id,
                        period,
                        achieved_amount: target.achieved_amount,
                        achievement_percentage: target.achievement_percentage,
                    });
                }
                None => {
                    log::debug!("seq={seq} achievement: employee {employee_id} has no target for {period}");
                }
            }
        }

        Ok(out_events)
    }
}
