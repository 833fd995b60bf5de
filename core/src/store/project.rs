use super::{date_at, date_text, period_at, CompStore, ProjectRow, ProjectTotals};
use crate::{
    command::NewProject,
    error::CompResult,
    types::{EmployeeId, Period, ProjectId, Seq},
};
use rusqlite::{params, OptionalExtension};

const PROJECT_COLUMNS: &str = "project_id, employee_id, client_name, project_value, product_type,
                               signature_date, period_year, period_month, is_from_social_media,
                               commission_rate, raw_commission, marketing_cost_allocated,
                               final_commission, notes, updated_seq";

fn project_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        project_id: r.get(0)?,
        employee_id: r.get(1)?,
        client_name: r.get(2)?,
        project_value: r.get(3)?,
        product_type: r.get(4)?,
        signature_date: date_at(r, 5)?,
        period: period_at(r, 6)?,
        is_from_social_media: r.get(8)?,
        commission_rate: r.get(9)?,
        raw_commission: r.get(10)?,
        marketing_cost_allocated: r.get(11)?,
        final_commission: r.get(12)?,
        notes: r.get(13)?,
        updated_seq: r.get::<_, i64>(14)? as u64,
    })
}

impl CompStore {
    /// Insert the externally authored facts of a project.
    /// Commission fields start at zero until the project is rated.
    pub fn insert_project(&self, p: &NewProject, seq: Seq) -> CompResult<ProjectId> {
        let period = Period::of(p.signature_date);
        self.conn.execute(
            "INSERT INTO project (
                employee_id, client_name, project_value, product_type, signature_date,
                period_year, period_month, is_from_social_media, notes, updated_seq
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                p.employee_id,
                p.client_name,
                p.project_value,
                p.product_type,
                date_text(p.signature_date),
                period.year,
                period.month,
                p.is_from_social_media,
                p.notes,
                seq as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_project(&self, project_id: ProjectId) -> CompResult<Option<ProjectRow>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM project WHERE project_id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![project_id], project_from_row)
            .optional()?;
        Ok(row)
    }

    /// Overwrite the externally authored fields of `p`; the period is
    /// re-derived from the signature date.
    pub fn update_project_facts(&self, p: &ProjectRow, seq: Seq) -> CompResult<()> {
        let period = Period::of(p.signature_date);
        self.conn.execute(
            "UPDATE project
             SET client_name = ?1, project_value = ?2, product_type = ?3,
                 signature_date = ?4, period_year = ?5, period_month = ?6,
                 is_from_social_media = ?7, notes = ?8, updated_seq = ?9
             WHERE project_id = ?10",
            params![
                p.client_name,
                p.project_value,
                p.product_type,
                date_text(p.signature_date),
                period.year,
                period.month,
                p.is_from_social_media,
                p.notes,
                seq as i64,
                p.project_id,
            ],
        )?;
        Ok(())
    }

    pub fn delete_project(&self, project_id: ProjectId) -> CompResult<()> {
        self.conn
            .execute("DELETE FROM project WHERE project_id = ?1", params![project_id])?;
        Ok(())
    }

    pub fn project_count_for(&self, employee_id: EmployeeId) -> CompResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM project WHERE employee_id = ?1",
            params![employee_id],
            |r| r.get(0),
        )?)
    }

    /// Sum of signed value for one employee in one period.
    pub fn sum_project_value(&self, employee_id: EmployeeId, period: Period) -> CompResult<f64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(project_value), 0.0) FROM project
             WHERE employee_id = ?1 AND period_year = ?2 AND period_month = ?3",
            params![employee_id, period.year, period.month],
            |r| r.get(0),
        )?)
    }

    /// Every social-media-sourced project signed in `period`, oldest first.
    pub fn list_social_projects(&self, period: Period) -> CompResult<Vec<ProjectRow>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM project
             WHERE is_from_social_media = 1 AND period_year = ?1 AND period_month = ?2
             ORDER BY project_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![period.year, period.month], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Projects filtered by employee and/or period, newest signature first.
    pub fn list_projects(
        &self,
        employee_id: Option<EmployeeId>,
        period: Option<Period>,
    ) -> CompResult<Vec<ProjectRow>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM project
             WHERE (?1 IS NULL OR employee_id = ?1)
               AND (?2 IS NULL OR (period_year = ?2 AND period_month = ?3))
             ORDER BY signature_date DESC, project_id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![employee_id, period.map(|p| p.year), period.map(|p| p.month)],
                project_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Record a rating: rate, raw commission, and the net figure derived from them.
    pub fn update_project_commission(
        &self,
        project_id: ProjectId,
        commission_rate: f64,
        raw_commission: f64,
        final_commission: f64,
        seq: Seq,
    ) -> CompResult<()> {
        self.conn.execute(
            "UPDATE project
             SET commission_rate = ?1, raw_commission = ?2, final_commission = ?3,
                 updated_seq = ?4
             WHERE project_id = ?5",
            params![commission_rate, raw_commission, final_commission, seq as i64, project_id],
        )?;
        Ok(())
    }

    /// Record a marketing allocation and the net commission after it.
    pub fn update_project_allocation(
        &self,
        project_id: ProjectId,
        marketing_cost_allocated: f64,
        final_commission: f64,
        seq: Seq,
    ) -> CompResult<()> {
        self.conn.execute(
            "UPDATE project
             SET marketing_cost_allocated = ?1, final_commission = ?2, updated_seq = ?3
             WHERE project_id = ?4",
            params![marketing_cost_allocated, final_commission, seq as i64, project_id],
        )?;
        Ok(())
    }

    pub fn employee_project_totals(
        &self,
        employee_id: EmployeeId,
        period: Period,
    ) -> CompResult<ProjectTotals> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(final_commission), 0.0),
                    COALESCE(SUM(marketing_cost_allocated), 0.0),
                    COUNT(*)
             FROM project
             WHERE employee_id = ?1 AND period_year = ?2 AND period_month = ?3",
            params![employee_id, period.year, period.month],
            |r| {
                Ok(ProjectTotals {
                    final_commission: r.get(0)?,
                    marketing_cost_allocated: r.get(1)?,
                    project_count: r.get(2)?,
                })
            },
        )?)
    }
}
