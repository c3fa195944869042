use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::SqliteStore;
use crate::workflows::projects::{NewProject, Project, ProjectId, ProjectRepository};
use crate::workflows::RepositoryError;

const PROJECT_COLUMNS: &str =
    "id, user_id, name, project_type, work_start_date, work_end_date, created_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId(row.get(0)?),
        user_id: row.get(1)?,
        name: row.get(2)?,
        project_type: row.get(3)?,
        work_start_date: row.get(4)?,
        work_end_date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn fetch_project(conn: &Connection, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
    Ok(conn
        .query_row(&sql, [id.0], project_from_row)
        .optional()?)
}

impl ProjectRepository for SqliteStore {
    fn insert(&self, project: NewProject) -> Result<Project, RepositoryError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects
                    (user_id, name, project_type, work_start_date, work_end_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project.user_id,
                    project.name,
                    project.project_type,
                    project.work_start_date,
                    project.work_end_date,
                    Utc::now(),
                ],
            )?;
            let id = ProjectId(conn.last_insert_rowid());
            fetch_project(conn, id)?.ok_or(RepositoryError::NotFound)
        })
    }

    fn fetch(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        self.with_conn(|conn| fetch_project(conn, id))
    }

    fn list(&self, user_id: &str) -> Result<Vec<Project>, RepositoryError> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ?1 ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let projects = stmt
                .query_map([user_id], project_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(projects)
        })
    }

    fn delete(&self, id: ProjectId) -> Result<bool, RepositoryError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM projects WHERE id = ?1", [id.0])?;
            Ok(removed > 0)
        })
    }
}
