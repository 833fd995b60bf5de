use super::{CompStore, EmployeeRow, TeamRow};
use crate::{
    error::CompResult,
    types::{EmployeeId, Role, Seq, TeamId},
};
use rusqlite::{params, OptionalExtension};

impl CompStore {
    // ── Employees ──────────────────────────────────────────────

    pub fn insert_employee(
        &self,
        name: &str,
        role: Role,
        base_salary: f64,
        team_id: Option<TeamId>,
        seq: Seq,
    ) -> CompResult<EmployeeId> {
        self.conn.execute(
            "INSERT INTO employee (name, role, base_salary, team_id, is_active, updated_seq)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![name, role, base_salary, team_id, seq as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_employee(&self, employee_id: EmployeeId) -> CompResult<Option<EmployeeRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT employee_id, name, role, base_salary, team_id, is_active
                 FROM employee WHERE employee_id = ?1",
                params![employee_id],
                |r| {
                    Ok(EmployeeRow {
                        employee_id: r.get(0)?,
                        name: r.get(1)?,
                        role: r.get(2)?,
                        base_salary: r.get(3)?,
                        team_id: r.get(4)?,
                        is_active: r.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Overwrite the mutable employee fields with `e`.
    pub fn update_employee(&self, e: &EmployeeRow, seq: Seq) -> CompResult<()> {
        self.conn.execute(
            "UPDATE employee
             SET name = ?1, role = ?2, base_salary = ?3, team_id = ?4,
                 is_active = ?5, updated_seq = ?6
             WHERE employee_id = ?7",
            params![
                e.name,
                e.role,
                e.base_salary,
                e.team_id,
                e.is_active,
                seq as i64,
                e.employee_id,
            ],
        )?;
        Ok(())
    }

    /// Delete the employee with their targets and scores, and clear the
    /// references teams, budgets and approvals hold to them. Callers
    /// check for projects and commission snapshots first.
    pub fn delete_employee(&self, employee_id: EmployeeId) -> CompResult<()> {
        for sql in [
            "UPDATE team SET leader_id = NULL WHERE leader_id = ?1",
            "UPDATE marketing_budget SET created_by = NULL WHERE created_by = ?1",
            "UPDATE commission SET approved_by = NULL WHERE approved_by = ?1",
            "DELETE FROM performance_score WHERE employee_id = ?1",
            "DELETE FROM target WHERE employee_id = ?1",
            "DELETE FROM employee WHERE employee_id = ?1",
        ] {
            self.conn.execute(sql, params![employee_id])?;
        }
        Ok(())
    }

    pub fn active_employee_ids(&self) -> CompResult<Vec<EmployeeId>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id FROM employee WHERE is_active = 1 ORDER BY employee_id ASC",
        )?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ── Teams ──────────────────────────────────────────────────

    pub fn insert_team(
        &self,
        name: &str,
        leader_id: Option<EmployeeId>,
        seq: Seq,
    ) -> CompResult<TeamId> {
        self.conn.execute(
            "INSERT INTO team (name, leader_id, created_seq) VALUES (?1, ?2, ?3)",
            params![name, leader_id, seq as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_team(&self, team_id: TeamId) -> CompResult<Option<TeamRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT team_id, name, leader_id FROM team WHERE team_id = ?1",
                params![team_id],
                |r| {
                    Ok(TeamRow {
                        team_id: r.get(0)?,
                        name: r.get(1)?,
                        leader_id: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn update_team(&self, t: &TeamRow) -> CompResult<()> {
        self.conn.execute(
            "UPDATE team SET name = ?1, leader_id = ?2 WHERE team_id = ?3",
            params![t.name, t.leader_id, t.team_id],
        )?;
        Ok(())
    }

    pub fn delete_team(&self, team_id: TeamId) -> CompResult<()> {
        self.conn
            .execute("DELETE FROM team WHERE team_id = ?1", params![team_id])?;
        Ok(())
    }

    pub fn team_members(&self, team_id: TeamId) -> CompResult<Vec<EmployeeId>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id FROM employee WHERE team_id = ?1 ORDER BY employee_id ASC",
        )?;
        let ids = stmt
            .query_map(params![team_id], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
