//! Project commission subsystem: rates newly signed projects.
//!
//! A project is rated once, when it is signed, against the achievement
//! ratio of its period with its own value already counted. Later edits
//! do not re-rate; an explicit rerate request does.
//!
//! Writes commission_rate and raw_commission. The net figure starts as
//! raw less whatever marketing cost is already allocated; the marketing
//! subsystem recomputes it from raw afterwards.

use crate::{
    achievement_subsystem::compute_achievement,
    config::CompConfig,
    error::{CompError, CompResult},
    event::CompEvent,
    marketing_subsystem::net_commission,
    rate_table::RateTable,
    store::CompStore,
    subsystem::CompSubsystem,
    types::{ProjectId, Role, Seq},
};

pub struct ProjectCommissionSubsystem {
    rates:                RateTable,
    social_media_penalty: f64,
}

impl ProjectCommissionSubsystem {
    pub fn new(config: &CompConfig) -> Self {
        Self {
            rates:                RateTable::from_config(config),
            social_media_penalty: config.policy.social_media_penalty,
        }
    }

    /// Tier rate less the social-media penalty. Not floored: a penalty
    /// larger than the tier rate yields a negative rate.
    pub fn commission_rate(&self, role: Role, ratio: f64, is_from_social_media: bool) -> f64 {
        let rate = self.rates.rate(role, ratio);
        if is_from_social_media {
            rate - self.social_media_penalty
        } else {
            rate
        }
    }

    fn rate_project(&self, store: &CompStore, seq: Seq, project_id: ProjectId) -> CompResult<CompEvent> {
        let project = store
            .get_project(project_id)?
            .ok_or_else(|| CompError::not_found("project", project_id))?;
        let employee = store
            .get_employee(project.employee_id)?
            .ok_or_else(|| CompError::not_found("employee", project.employee_id))?;

        // The project row is already stored, so it counts toward its own tier.
        let ratio = compute_achievement(store, employee.employee_id, project.period)?;
        let rate = self.commission_rate(employee.role, ratio, project.is_from_social_media);
        let raw = project.project_value * rate;
        let net = net_commission(raw, project.marketing_cost_allocated);

        store.update_project_commission(project_id, rate, raw, net, seq)?;

        log::info!(
            "seq={seq} project: #{project_id} ({}, {}) rated {:.4} at ratio {:.3} -> {:.2}",
            employee.role,
            project.period,
            rate,
            ratio,
            raw
        );

        Ok(CompEvent::ProjectRated {
            seq,
            project_id,
            employee_id: employee.employee_id,
            period: project.period,
            achievement_ratio: ratio,
            commission_rate: rate,
            raw_commission: raw,
            is_from_social_media: project.is_from_social_media,
        })
    }
}

impl CompSubsystem for ProjectCommissionSubsystem {
    fn name(&self) -> &'static str { "project" }

    fn update(
        &mut self,
        seq: Seq,
        store: &CompStore,
        events_in: &[CompEvent],
    ) -> CompResult<Vec<CompEvent>> {
        let mut out_events = Vec::new();

        for event in events_in {
            match event {
                CompEvent::ProjectSigned { project_id, .. }
                | CompEvent::ProjectRerateRequested { project_id, .. } => {
                    out_events.push(self.rate_project(store, seq, *project_id)?);
                }
                _ => {}
            }
        }

        Ok(out_events)
    }
}
