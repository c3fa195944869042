use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::SqliteStore;
use crate::workflows::deadlines::{
    Deadline, DeadlineId, DeadlinePatch, DeadlineQuery, DeadlineRepository, DeadlineStatus,
    LienRule, NewDeadline,
};
use crate::workflows::projects::ProjectId;
use crate::workflows::RepositoryError;

const DEADLINE_COLUMNS: &str = "id, user_id, project_id, deadline_type, deadline_date, \
     trigger_date, title, description, status, priority, completed_date, created_at, updated_at";

fn deadline_from_row(row: &Row<'_>) -> rusqlite::Result<Deadline> {
    Ok(Deadline {
        id: DeadlineId(row.get(0)?),
        user_id: row.get(1)?,
        project_id: row.get::<_, Option<i64>>(2)?.map(ProjectId),
        deadline_type: row.get(3)?,
        deadline_date: row.get(4)?,
        trigger_date: row.get(5)?,
        title: row.get(6)?,
        description: row.get(7)?,
        status: row.get(8)?,
        priority: row.get(9)?,
        completed_date: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn fetch_deadline(conn: &Connection, id: DeadlineId) -> Result<Option<Deadline>, RepositoryError> {
    let sql = format!("SELECT {DEADLINE_COLUMNS} FROM deadlines WHERE id = ?1");
    Ok(conn
        .query_row(&sql, [id.0], deadline_from_row)
        .optional()?)
}

fn insert_deadline(conn: &Connection, deadline: &NewDeadline) -> Result<Deadline, RepositoryError> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO deadlines
            (user_id, project_id, deadline_type, deadline_date, trigger_date, title,
             description, status, priority, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            deadline.user_id,
            deadline.project_id.map(|id| id.0),
            deadline.deadline_type,
            deadline.deadline_date,
            deadline.trigger_date,
            deadline.title,
            deadline.description,
            DeadlineStatus::Pending,
            deadline.priority,
            now,
        ],
    )?;
    let id = DeadlineId(conn.last_insert_rowid());
    fetch_deadline(conn, id)?.ok_or(RepositoryError::NotFound)
}

impl DeadlineRepository for SqliteStore {
    fn lien_rules(&self) -> Result<Vec<LienRule>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT rule_type, project_type, deadline_days, description, trigger_event,
                        statutory_reference
                 FROM lien_rules
                 ORDER BY rule_type, project_type",
            )?;
            let rules = stmt
                .query_map([], |row| {
                    Ok(LienRule {
                        rule_type: row.get(0)?,
                        project_type: row.get(1)?,
                        deadline_days: row.get(2)?,
                        description: row.get(3)?,
                        trigger_event: row.get(4)?,
                        statutory_reference: row.get(5)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rules)
        })
    }

    fn insert(&self, deadline: NewDeadline) -> Result<Deadline, RepositoryError> {
        self.with_conn(|conn| insert_deadline(conn, &deadline))
    }

    fn insert_all(&self, deadlines: Vec<NewDeadline>) -> Result<Vec<Deadline>, RepositoryError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let stored = deadlines
                .iter()
                .map(|deadline| insert_deadline(&tx, deadline))
                .collect::<Result<Vec<_>, _>>()?;
            tx.commit()?;
            Ok(stored)
        })
    }

    fn fetch(&self, id: DeadlineId) -> Result<Option<Deadline>, RepositoryError> {
        self.with_conn(|conn| fetch_deadline(conn, id))
    }

    fn list(&self, query: &DeadlineQuery) -> Result<Vec<Deadline>, RepositoryError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {DEADLINE_COLUMNS} FROM deadlines
                 WHERE user_id = ?1
                   AND (?2 IS NULL OR status = ?2)
                   AND (?3 IS NULL OR deadline_date <= ?3)
                 ORDER BY deadline_date, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let deadlines = stmt
                .query_map(
                    params![query.user_id, query.status, query.due_on_or_before],
                    deadline_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(deadlines)
        })
    }

    fn update(
        &self,
        id: DeadlineId,
        patch: &DeadlinePatch,
        today: NaiveDate,
    ) -> Result<Deadline, RepositoryError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut deadline = fetch_deadline(&tx, id)?.ok_or(RepositoryError::NotFound)?;
            deadline
                .apply_patch(patch, today)
                .map_err(|err| RepositoryError::Rejected(err.0))?;

            tx.execute(
                "UPDATE deadlines
                 SET deadline_type = ?1, deadline_date = ?2, trigger_date = ?3, title = ?4,
                     description = ?5, status = ?6, priority = ?7, completed_date = ?8,
                     updated_at = ?9
                 WHERE id = ?10",
                params![
                    deadline.deadline_type,
                    deadline.deadline_date,
                    deadline.trigger_date,
                    deadline.title,
                    deadline.description,
                    deadline.status,
                    deadline.priority,
                    deadline.completed_date,
                    Utc::now(),
                    id.0,
                ],
            )?;
            let updated = fetch_deadline(&tx, id)?.ok_or(RepositoryError::NotFound)?;
            tx.commit()?;
            Ok(updated)
        })
    }

    fn delete(&self, id: DeadlineId) -> Result<bool, RepositoryError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM deadlines WHERE id = ?1", [id.0])?;
            Ok(removed > 0)
        })
    }
}
