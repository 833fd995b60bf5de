use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One commission tier. Covers ratios up to and including `max_ratio`;
/// `None` is the open-ended top tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RateBracket {
    pub max_ratio: Option<f64>,
    pub rate:      f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRates {
    pub role:     Role,
    pub brackets: Vec<RateBracket>,
}

#[derive(Debug, Clone, Deserialize)]
struct RateTableFile {
    roles: Vec<RoleRates>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationPolicy {
    /// Subtracted from the tier rate for social-media-sourced projects.
    pub social_media_penalty: f64,
    /// Monetary bonus per weighted KPI point.
    pub performance_bonus_per_point: f64,
}

impl Default for CompensationPolicy {
    fn default() -> Self {
        Self {
            social_media_penalty:        0.005,
            performance_bonus_per_point: 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompConfig {
    pub rate_table: HashMap<Role, Vec<RateBracket>>,
    pub policy:     CompensationPolicy,
}

impl CompConfig {
    /// Load from the data/ directory.
    /// In tests, use CompConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let rate_path = format!("{data_dir}/commission/rate_table.json");
        let rate_content = std::fs::read_to_string(&rate_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {rate_path}: {e}"))?;
        let rate_file: RateTableFile = serde_json::from_str(&rate_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {rate_path}: {e}"))?;

        let policy_path = format!("{data_dir}/commission/policy.json");
        let policy_content = std::fs::read_to_string(&policy_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {policy_path}: {e}"))?;
        let policy: CompensationPolicy = serde_json::from_str(&policy_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {policy_path}: {e}"))?;

        let mut rate_table = HashMap::new();
        for entry in rate_file.roles {
            validate_brackets(entry.role, &entry.brackets)
                .map_err(|e| anyhow::anyhow!("{rate_path}: {e}"))?;
            if rate_table.insert(entry.role, entry.brackets).is_some() {
                anyhow::bail!("{rate_path}: role {} listed twice", entry.role);
            }
        }

        Ok(Self { rate_table, policy })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let tiered = |rates: [f64; 4]| {
            vec![
                RateBracket { max_ratio: Some(0.5), rate: rates[0] },
                RateBracket { max_ratio: Some(0.8), rate: rates[1] },
                RateBracket { max_ratio: Some(1.0), rate: rates[2] },
                RateBracket { max_ratio: None,      rate: rates[3] },
            ]
        };
        Self {
            rate_table: [
                (Role::SalesRep,     tiered([0.01, 0.015, 0.02, 0.025])),
                (Role::TeamLeader,   tiered([0.005, 0.0075, 0.01, 0.0125])),
                (Role::SalesManager, vec![RateBracket { max_ratio: None, rate: 0.005 }]),
            ]
            .into(),
            policy: CompensationPolicy::default(),
        }
    }
}

/// Brackets must ascend strictly and end with exactly one open tier,
/// otherwise some ratio would have no rate or two.
fn validate_brackets(role: Role, brackets: &[RateBracket]) -> Result<(), String> {
    let Some((last, rest)) = brackets.split_last() else {
        return Err(format!("role {role} has no brackets"));
    };
    if last.max_ratio.is_some() {
        return Err(format!("role {role}: last bracket must be open-ended"));
    }
    let mut floor = f64::NEG_INFINITY;
    for b in rest {
        match b.max_ratio {
            Some(m) if m > floor => floor = m,
            Some(m) => return Err(format!("role {role}: bracket bound {m} not ascending")),
            None => return Err(format!("role {role}: open-ended bracket before the last")),
        }
    }
    Ok(())
}
