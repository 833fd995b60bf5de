//! Rate table: maps (role, achievement ratio) to a commission rate.
//!
//! Pure lookup over the configured brackets. Bounds are inclusive,
//! so a ratio of exactly 0.8 falls in the <=0.8 tier.

use crate::{config::{CompConfig, RateBracket}, types::Role};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RateTable {
    tiers: HashMap<Role, Vec<RateBracket>>,
}

impl RateTable {
    pub fn new(tiers: HashMap<Role, Vec<RateBracket>>) -> Self {
        Self { tiers }
    }

    pub fn from_config(config: &CompConfig) -> Self {
        Self::new(config.rate_table.clone())
    }

    /// Rate for `role` at `ratio`. Roles without a configured table earn nothing.
    pub fn rate(&self, role: Role, ratio: f64) -> f64 {
        let Some(brackets) = self.tiers.get(&role) else {
            return 0.0;
        };
        brackets
            .iter()
            .find(|b| b.max_ratio.map_or(true, |max| ratio <= max))
            .map(|b| b.rate)
            .unwrap_or(0.0)
    }
}
