use super::{period_at, CompStore, TargetRow};
use crate::{
    error::CompResult,
    types::{EmployeeId, Period, Seq},
};
use rusqlite::{params, OptionalExtension};

const TARGET_COLUMNS: &str = "employee_id, year, month, target_amount,
                              achieved_amount, achievement_percentage, updated_seq";

fn target_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<TargetRow> {
    Ok(TargetRow {
        employee_id: r.get(0)?,
        period: period_at(r, 1)?,
        target_amount: r.get(3)?,
        achieved_amount: r.get(4)?,
        achievement_percentage: r.get(5)?,
        updated_seq: r.get::<_, i64>(6)? as u64,
    })
}

impl CompStore {
    pub fn insert_target(
        &self,
        employee_id: EmployeeId,
        period: Period,
        target_amount: f64,
        seq: Seq,
    ) -> CompResult<()> {
        self.conn.execute(
            "INSERT INTO target (employee_id, year, month, target_amount, updated_seq)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![employee_id, period.year, period.month, target_amount, seq as i64],
        )?;
        Ok(())
    }

    pub fn get_target(&self, employee_id: EmployeeId, period: Period) -> CompResult<Option<TargetRow>> {
        let sql = format!(
            "SELECT {TARGET_COLUMNS} FROM target
             WHERE employee_id = ?1 AND year = ?2 AND month = ?3"
        );
        let row = self
            .conn
            .query_row(&sql, params![employee_id, period.year, period.month], target_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn update_target_amount(
        &self,
        employee_id: EmployeeId,
        period: Period,
        target_amount: f64,
        seq: Seq,
    ) -> CompResult<()> {
        self.conn.execute(
            "UPDATE target SET target_amount = ?1, updated_seq = ?2
             WHERE employee_id = ?3 AND year = ?4 AND month = ?5",
            params![target_amount, seq as i64, employee_id, period.year, period.month],
        )?;
        Ok(())
    }

    pub fn delete_target(&self, employee_id: EmployeeId, period: Period) -> CompResult<()> {
        self.conn.execute(
            "DELETE FROM target WHERE employee_id = ?1 AND year = ?2 AND month = ?3",
            params![employee_id, period.year, period.month],
        )?;
        Ok(())
    }

    /// Write the derived progress fields of a target, keyed by (employee, period).
    pub fn upsert_target(&self, t: &TargetRow) -> CompResult<()> {
        self.conn.execute(
            "INSERT INTO target (
                employee_id, year, month, target_amount,
                achieved_amount, achievement_percentage, updated_seq
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(employee_id, year, month) DO UPDATE SET
                target_amount          = excluded.target_amount,
                achieved_amount        = excluded.achieved_amount,
                achievement_percentage = excluded.achievement_percentage,
                updated_seq            = excluded.updated_seq",
            params![
                t.employee_id,
                t.period.year,
                t.period.month,
                t.target_amount,
                t.achieved_amount,
                t.achievement_percentage,
                t.updated_seq as i64,
            ],
        )?;
        Ok(())
    }

    pub fn targets_for_period(&self, period: Period) -> CompResult<Vec<TargetRow>> {
        let sql = format!(
            "SELECT {TARGET_COLUMNS} FROM target
             WHERE year = ?1 AND month = ?2 ORDER BY employee_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![period.year, period.month], target_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
