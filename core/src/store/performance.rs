use super::{period_at, CompStore, KpiRow, ScoreRow};
use crate::{
    error::CompResult,
    types::{EmployeeId, KpiId, Period, Seq},
};
use rusqlite::{params, OptionalExtension};

impl CompStore {
    // ── KPIs ───────────────────────────────────────────────────

    pub fn insert_kpi(
        &self,
        name: &str,
        description: Option<&str>,
        weight: f64,
        max_score: f64,
    ) -> CompResult<KpiId> {
        self.conn.execute(
            "INSERT INTO performance_kpi (name, description, weight, max_score, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![name, description, weight, max_score],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_kpi(&self, kpi_id: KpiId) -> CompResult<Option<KpiRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT kpi_id, name, description, weight, max_score, is_active
                 FROM performance_kpi WHERE kpi_id = ?1",
                params![kpi_id],
                |r| {
                    Ok(KpiRow {
                        kpi_id: r.get(0)?,
                        name: r.get(1)?,
                        description: r.get(2)?,
                        weight: r.get(3)?,
                        max_score: r.get(4)?,
                        is_active: r.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn update_kpi(&self, k: &KpiRow) -> CompResult<()> {
        self.conn.execute(
            "UPDATE performance_kpi
             SET name = ?1, description = ?2, weight = ?3, max_score = ?4
             WHERE kpi_id = ?5",
            params![k.name, k.description, k.weight, k.max_score, k.kpi_id],
        )?;
        Ok(())
    }

    pub fn deactivate_kpi(&self, kpi_id: KpiId) -> CompResult<()> {
        self.conn.execute(
            "UPDATE performance_kpi SET is_active = 0 WHERE kpi_id = ?1",
            params![kpi_id],
        )?;
        Ok(())
    }

    // ── Scores ─────────────────────────────────────────────────

    /// Create or overwrite the score for (employee, kpi, period).
    /// A second submission replaces the first; it never accumulates.
    pub fn upsert_score(&self, s: &ScoreRow, seq: Seq) -> CompResult<()> {
        self.conn.execute(
            "INSERT INTO performance_score (
                employee_id, kpi_id, year, month, score, weighted_score, notes, updated_seq
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(employee_id, kpi_id, year, month) DO UPDATE SET
                score          = excluded.score,
                weighted_score = excluded.weighted_score,
                notes          = excluded.notes,
                updated_seq    = excluded.updated_seq",
            params![
                s.employee_id,
                s.kpi_id,
                s.period.year,
                s.period.month,
                s.score,
                s.weighted_score,
                s.notes,
                seq as i64,
            ],
        )?;
        Ok(())
    }

    /// Recompute `weighted_score` for every score of `kpi_id`.
    /// Returns the number of rows touched.
    pub fn reweight_scores(&self, kpi_id: KpiId, weight: f64, seq: Seq) -> CompResult<usize> {
        Ok(self.conn.execute(
            "UPDATE performance_score SET weighted_score = score * ?1, updated_seq = ?2
             WHERE kpi_id = ?3",
            params![weight, seq as i64, kpi_id],
        )?)
    }

    pub fn highest_score(&self, kpi_id: KpiId) -> CompResult<Option<f64>> {
        Ok(self.conn.query_row(
            "SELECT MAX(score) FROM performance_score WHERE kpi_id = ?1",
            params![kpi_id],
            |r| r.get(0),
        )?)
    }

    pub fn scores_for(&self, employee_id: EmployeeId, period: Period) -> CompResult<Vec<ScoreRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, kpi_id, year, month, score, weighted_score, notes
             FROM performance_score
             WHERE employee_id = ?1 AND year = ?2 AND month = ?3
             ORDER BY kpi_id ASC",
        )?;
        let rows = stmt
            .query_map(params![employee_id, period.year, period.month], |r| {
                Ok(ScoreRow {
                    employee_id: r.get(0)?,
                    kpi_id: r.get(1)?,
                    period: period_at(r, 2)?,
                    score: r.get(4)?,
                    weighted_score: r.get(5)?,
                    notes: r.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn sum_weighted_scores(&self, employee_id: EmployeeId, period: Period) -> CompResult<f64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(weighted_score), 0.0) FROM performance_score
             WHERE employee_id = ?1 AND year = ?2 AND month = ?3",
            params![employee_id, period.year, period.month],
            |r| r.get(0),
        )?)
    }
}
