use super::{period_at, BudgetRow, CompStore};
use crate::{
    error::CompResult,
    types::{EmployeeId, Period, Seq},
};
use rusqlite::{params, OptionalExtension};

fn budget_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<BudgetRow> {
    Ok(BudgetRow {
        period: period_at(r, 0)?,
        total_budget: r.get(2)?,
        allocated_budget: r.get(3)?,
        remaining_budget: r.get(4)?,
        created_by: r.get(5)?,
        updated_seq: r.get::<_, i64>(6)? as u64,
    })
}

impl CompStore {
    pub fn get_budget(&self, period: Period) -> CompResult<Option<BudgetRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT year, month, total_budget, allocated_budget, remaining_budget,
                        created_by, updated_seq
                 FROM marketing_budget WHERE year = ?1 AND month = ?2",
                params![period.year, period.month],
                budget_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Create or overwrite the budget for `period`. Nothing is allocated
    /// until the next reallocation runs.
    pub fn upsert_budget(
        &self,
        period: Period,
        total_budget: f64,
        created_by: Option<EmployeeId>,
        seq: Seq,
    ) -> CompResult<()> {
        self.conn.execute(
            "INSERT INTO marketing_budget (
                year, month, total_budget, allocated_budget, remaining_budget,
                created_by, updated_seq
            ) VALUES (?1, ?2, ?3, 0.0, ?3, ?4, ?5)
            ON CONFLICT(year, month) DO UPDATE SET
                total_budget     = excluded.total_budget,
                allocated_budget = 0.0,
                remaining_budget = excluded.total_budget,
                created_by       = COALESCE(excluded.created_by, marketing_budget.created_by),
                updated_seq      = excluded.updated_seq",
            params![period.year, period.month, total_budget, created_by, seq as i64],
        )?;
        Ok(())
    }

    pub fn update_budget_allocation(
        &self,
        period: Period,
        allocated_budget: f64,
        remaining_budget: f64,
        seq: Seq,
    ) -> CompResult<()> {
        self.conn.execute(
            "UPDATE marketing_budget
             SET allocated_budget = ?1, remaining_budget = ?2, updated_seq = ?3
             WHERE year = ?4 AND month = ?5",
            params![allocated_budget, remaining_budget, seq as i64, period.year, period.month],
        )?;
        Ok(())
    }

    pub fn list_budgets(&self) -> CompResult<Vec<BudgetRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, month, total_budget, allocated_budget, remaining_budget,
                    created_by, updated_seq
             FROM marketing_budget ORDER BY year DESC, month DESC",
        )?;
        let rows = stmt
            .query_map([], budget_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
