use super::{period_at, CommissionRow, CompStore};
use crate::{
    error::CompResult,
    types::{EmployeeId, Period, Seq},
};
use rusqlite::{params, OptionalExtension};

const COMMISSION_COLUMNS: &str = "employee_id, year, month, base_commission, marketing_deduction,
                                  performance_bonus, final_commission, total_salary,
                                  is_approved, approved_by, approved_seq, updated_seq";

fn commission_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<CommissionRow> {
    Ok(CommissionRow {
        employee_id: r.get(0)?,
        period: period_at(r, 1)?,
        base_commission: r.get(3)?,
        marketing_deduction: r.get(4)?,
        performance_bonus: r.get(5)?,
        final_commission: r.get(6)?,
        total_salary: r.get(7)?,
        is_approved: r.get(8)?,
        approved_by: r.get(9)?,
        approved_seq: r.get::<_, Option<i64>>(10)?.map(|s| s as u64),
        updated_seq: r.get::<_, i64>(11)? as u64,
    })
}

impl CompStore {
    /// Write the snapshot for (employee, period), replacing any earlier one.
    /// Replacing figures also drops a prior approval.
    pub fn upsert_commission(&self, c: &CommissionRow) -> CompResult<()> {
        self.conn.execute(
            "INSERT INTO commission (
                employee_id, year, month, base_commission, marketing_deduction,
                performance_bonus, final_commission, total_salary,
                is_approved, approved_by, approved_seq, updated_seq
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL, NULL, ?9)
            ON CONFLICT(employee_id, year, month) DO UPDATE SET
                base_commission     = excluded.base_commission,
                marketing_deduction = excluded.marketing_deduction,
                performance_bonus   = excluded.performance_bonus,
                final_commission    = excluded.final_commission,
                total_salary        = excluded.total_salary,
                is_approved         = 0,
                approved_by         = NULL,
                approved_seq        = NULL,
                updated_seq         = excluded.updated_seq",
            params![
                c.employee_id,
                c.period.year,
                c.period.month,
                c.base_commission,
                c.marketing_deduction,
                c.performance_bonus,
                c.final_commission,
                c.total_salary,
                c.updated_seq as i64,
            ],
        )?;
        Ok(())
    }

    pub fn get_commission(
        &self,
        employee_id: EmployeeId,
        period: Period,
    ) -> CompResult<Option<CommissionRow>> {
        let sql = format!(
            "SELECT {COMMISSION_COLUMNS} FROM commission
             WHERE employee_id = ?1 AND year = ?2 AND month = ?3"
        );
        let row = self
            .conn
            .query_row(&sql, params![employee_id, period.year, period.month], commission_from_row)
            .optional()?;
        Ok(row)
    }

    pub fn commissions_for_period(&self, period: Period) -> CompResult<Vec<CommissionRow>> {
        let sql = format!(
            "SELECT {COMMISSION_COLUMNS} FROM commission
             WHERE year = ?1 AND month = ?2 ORDER BY employee_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![period.year, period.month], commission_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn commission_row_count(&self, employee_id: EmployeeId, period: Period) -> CompResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM commission WHERE employee_id = ?1 AND year = ?2 AND month = ?3",
            params![employee_id, period.year, period.month],
            |r| r.get(0),
        )?)
    }

    pub fn commission_count_for(&self, employee_id: EmployeeId) -> CompResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM commission WHERE employee_id = ?1",
            params![employee_id],
            |r| r.get(0),
        )?)
    }

    pub fn approve_commission(
        &self,
        employee_id: EmployeeId,
        period: Period,
        approver_id: EmployeeId,
        seq: Seq,
    ) -> CompResult<()> {
        self.conn.execute(
            "UPDATE commission SET is_approved = 1, approved_by = ?1, approved_seq = ?2
             WHERE employee_id = ?3 AND year = ?4 AND month = ?5",
            params![approver_id, seq as i64, employee_id, period.year, period.month],
        )?;
        Ok(())
    }
}
