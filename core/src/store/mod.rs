//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Engine components call store methods and never execute SQL directly.

use crate::{
    error::CompResult,
    event::EventLogEntry,
    types::{EmployeeId, KpiId, Period, ProjectId, Role, Seq, TeamId},
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::time::Duration;

mod budget;
mod commission;
mod employee;
mod performance;
mod project;
mod target;

/// How long a writer waits on another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CompStore {
    conn: Connection,
}

impl CompStore {
    pub fn open(path: &str) -> CompResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CompResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to re-run.
    pub fn migrate(&self) -> CompResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_compensation.sql"))?;
        Ok(())
    }

    /// Run `f` as one IMMEDIATE transaction: committed if it returns Ok,
    /// rolled back otherwise. Taking the write lock up front serialises
    /// concurrent commands touching the same period across connections.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> CompResult<T>) -> CompResult<T> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> CompResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (seq, op_id, component, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.seq as i64,
                entry.op_id,
                entry.component,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_seq(&self, seq: Seq) -> CompResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seq, op_id, component, event_type, payload
             FROM event_log WHERE seq = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![seq as i64], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    seq: row.get::<_, i64>(1)? as u64,
                    op_id: row.get(2)?,
                    component: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Highest committed seq, 0 for a fresh ledger.
    pub fn last_seq(&self) -> CompResult<Seq> {
        let seq: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM event_log",
            [],
            |r| r.get(0),
        )?;
        Ok(seq as u64)
    }

    pub fn event_count(&self) -> CompResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM event_log", [], |r| r.get(0))?)
    }
}

/// Read the (year, month) pair starting at column `idx`.
fn period_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Period> {
    Ok(Period {
        year: row.get(idx)?,
        month: row.get(idx + 1)?,
    })
}

fn date_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ── Row types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmployeeRow {
    pub employee_id: EmployeeId,
    pub name:        String,
    pub role:        Role,
    pub base_salary: f64,
    pub team_id:     Option<TeamId>,
    pub is_active:   bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamRow {
    pub team_id:   TeamId,
    pub name:      String,
    pub leader_id: Option<EmployeeId>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TargetRow {
    pub employee_id:            EmployeeId,
    pub period:                 Period,
    pub target_amount:          f64,
    pub achieved_amount:        f64,
    pub achievement_percentage: f64,
    pub updated_seq:            Seq,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectRow {
    pub project_id:               ProjectId,
    pub employee_id:              EmployeeId,
    pub client_name:              String,
    pub project_value:            f64,
    pub product_type:             String,
    pub signature_date:           NaiveDate,
    pub period:                   Period,
    pub is_from_social_media:     bool,
    pub commission_rate:          f64,
    /// project_value × commission_rate, before any marketing deduction.
    pub raw_commission:           f64,
    pub marketing_cost_allocated: f64,
    /// raw_commission net of marketing_cost_allocated, floored at zero.
    pub final_commission:         f64,
    pub notes:                    Option<String>,
    pub updated_seq:              Seq,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BudgetRow {
    pub period:           Period,
    pub total_budget:     f64,
    pub allocated_budget: f64,
    pub remaining_budget: f64,
    pub created_by:       Option<EmployeeId>,
    pub updated_seq:      Seq,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KpiRow {
    pub kpi_id:      KpiId,
    pub name:        String,
    pub description: Option<String>,
    pub weight:      f64,
    pub max_score:   f64,
    pub is_active:   bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreRow {
    pub employee_id:    EmployeeId,
    pub kpi_id:         KpiId,
    pub period:         Period,
    pub score:          f64,
    pub weighted_score: f64,
    pub notes:          Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommissionRow {
    pub employee_id:         EmployeeId,
    pub period:              Period,
    pub base_commission:     f64,
    pub marketing_deduction: f64,
    pub performance_bonus:   f64,
    pub final_commission:    f64,
    pub total_salary:        f64,
    pub is_approved:         bool,
    pub approved_by:         Option<EmployeeId>,
    pub approved_seq:        Option<Seq>,
    pub updated_seq:         Seq,
}

/// Per-employee project sums for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProjectTotals {
    pub final_commission:         f64,
    pub marketing_cost_allocated: f64,
    pub project_count:            i64,
}
