//! Marketing allocation subsystem: spreads a month's marketing budget
//! over that month's social-media-sourced projects by value share, and
//! nets each project's share out of its commission.
//!
//! Every project's share depends on every other project's value, so any
//! change to the qualifying set or to the budget re-runs the whole
//! period. Net commission is always recomputed from raw_commission, so
//! running twice never deducts twice.

use crate::{
    error::CompResult,
    event::{AllocationSkip, CompEvent},
    store::CompStore,
    subsystem::CompSubsystem,
    types::{Period, ProjectId, Seq},
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub project_id: ProjectId,
    pub share:      f64,
    pub allocated:  f64,
}

/// Split `total_budget` over `projects` (id, value) in proportion to value.
/// Empty when there is no value to split by.
pub fn allocate(total_budget: f64, projects: &[(ProjectId, f64)]) -> Vec<Allocation> {
    let total_value: f64 = projects.iter().map(|(_, v)| v).sum();
    if total_value <= 0.0 {
        return Vec::new();
    }
    projects
        .iter()
        .map(|&(project_id, value)| {
            let share = value / total_value;
            Allocation { project_id, share, allocated: total_budget * share }
        })
        .collect()
}

/// Raw commission less allocated marketing cost, never below zero.
pub fn net_commission(raw_commission: f64, allocated: f64) -> f64 {
    (raw_commission - allocated).max(0.0)
}

/// Redistribute the budget of `period` over its social projects.
pub fn reallocate(store: &CompStore, seq: Seq, period: Period) -> CompResult<Vec<CompEvent>> {
    let projects = store.list_social_projects(period)?;
    let budget = store.get_budget(period)?;

    let skip = |reason| CompEvent::MarketingAllocationSkipped { seq, period, reason };

    if projects.is_empty() {
        if let Some(b) = &budget {
            store.update_budget_allocation(period, 0.0, b.total_budget, seq)?;
        }
        log::debug!("seq={seq} marketing: no social projects in {period}");
        return Ok(vec![skip(AllocationSkip::NoSocialProjects)]);
    }
    let Some(budget) = budget else {
        log::warn!(
            "seq={seq} marketing: {} social project(s) in {period} but no budget; allocation deferred",
            projects.len()
        );
        return Ok(vec![skip(AllocationSkip::NoBudget)]);
    };

    let values: Vec<(ProjectId, f64)> =
        projects.iter().map(|p| (p.project_id, p.project_value)).collect();
    let total_social_value: f64 = values.iter().map(|(_, v)| v).sum();
    let allocations = allocate(budget.total_budget, &values);
    if allocations.is_empty() {
        log::warn!("seq={seq} marketing: social value in {period} is zero; nothing to allocate");
        return Ok(vec![skip(AllocationSkip::ZeroSocialValue)]);
    }

    let mut events = Vec::with_capacity(allocations.len() + 1);
    let mut allocated_total = 0.0;
    for (project, a) in projects.iter().zip(&allocations) {
        let net = net_commission(project.raw_commission, a.allocated);
        store.update_project_allocation(a.project_id, a.allocated, net, seq)?;
        allocated_total += a.allocated;
        log::debug!(
            "seq={seq} marketing: #{} share {:.4} allocated {:.2}, net {:.2}",
            a.project_id,
            a.share,
            a.allocated,
            net
        );
        events.push(CompEvent::ProjectCostAllocated {
            seq,
            project_id: a.project_id,
            period,
            share: a.share,
            allocated: a.allocated,
            final_commission: net,
        });
    }

    store.update_budget_allocation(
        period,
        allocated_total,
        budget.total_budget - allocated_total,
        seq,
    )?;

    log::info!(
        "seq={seq} marketing: reallocated {:.2} over {} project(s) in {period}",
        allocated_total,
        allocations.len()
    );

    events.push(CompEvent::MarketingReallocated {
        seq,
        period,
        total_budget: budget.total_budget,
        total_social_value,
        project_count: allocations.len(),
        allocated_total,
    });
    Ok(events)
}

#[derive(Default)]
pub struct MarketingSubsystem;

impl MarketingSubsystem {
    pub fn new() -> Self {
        Self
    }

    /// Periods whose qualifying set or budget changed.
    fn affected(events_in: &[CompEvent]) -> BTreeSet<Period> {
        let mut periods = BTreeSet::new();
        for event in events_in {
            match event {
                CompEvent::ProjectRated { period, is_from_social_media: true, .. }
                | CompEvent::ProjectRemoved { period, was_social: true, .. }
                | CompEvent::BudgetSet { period, .. }
                | CompEvent::ReallocationRequested { period, .. } => {
                    periods.insert(*period);
                }
                CompEvent::ProjectChanged { before, after, was_social, is_social, .. } => {
                    if *was_social {
                        periods.insert(*before);
                    }
                    if *is_social {
                        periods.insert(*after);
                    }
                }
                _ => {}
            }
        }
        periods
    }
}

impl CompSubsystem for MarketingSubsystem {
    fn name(&self) -> &'static str { "marketing" }

    fn update(
        &mut self,
        seq: Seq,
        store: &CompStore,
        events_in: &[CompEvent],
    ) -> CompResult<Vec<CompEvent>> {
        let mut out_events = Vec::new();
        for period in Self::affected(events_in) {
            out_events.extend(reallocate(store, seq, period)?);
        }
        Ok(out_events)
    }
}
