//! Shared primitive types used across the engine.

use crate::error::{CompError, CompResult};
use chrono::{Datelike, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical timestamp: one per committed command.
pub type Seq = u64;

pub type EmployeeId = i64;
pub type TeamId = i64;
pub type ProjectId = i64;
pub type KpiId = i64;

/// A calendar month. Every target, budget, score and commission is
/// bucketed by one of these; projects derive theirs from the signature date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year:  i32,
    pub month: u32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> CompResult<Self> {
        Period { year, month }.validated()
    }

    pub fn of(date: NaiveDate) -> Self {
        Period { year: date.year(), month: date.month() }
    }

    /// Periods arrive from deserialised commands, so they are re-checked at intake.
    pub fn validated(self) -> CompResult<Self> {
        if (1..=12).contains(&self.month) && (1..=9999).contains(&self.year) {
            Ok(self)
        } else {
            Err(CompError::InvalidPeriod { month: self.month, year: self.year })
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Period::of(date) == *self
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SalesRep,
    TeamLeader,
    SalesManager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SalesRep, Role::TeamLeader, Role::SalesManager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SalesRep     => "sales_rep",
            Role::TeamLeader   => "team_leader",
            Role::SalesManager => "sales_manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales_rep"     => Ok(Role::SalesRep),
            "team_leader"   => Ok(Role::TeamLeader),
            "sales_manager" => Ok(Role::SalesManager),
            other => Err(CompError::InvalidInput(format!("unknown role: {other}"))),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}
