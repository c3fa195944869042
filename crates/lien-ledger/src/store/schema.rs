//! Database schema definitions

use rusqlite::{params, Connection};
use tracing::info;

use crate::workflows::deadlines::LienRuleTable;
use crate::workflows::RepositoryError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Creates or migrates the schema, then seeds any missing lien rules.
pub fn init_schema(conn: &Connection) -> Result<(), RepositoryError> {
    let current_version = schema_version(conn)?;

    if current_version == 0 {
        info!(version = SCHEMA_VERSION, "creating database schema");
        conn.execute_batch(TABLES)?;
        conn.execute_batch(INDEXES)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "migrating database schema"
        );
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else {
        info!(version = current_version, "database schema is up to date");
    }

    let seeded = seed_lien_rules(conn, &LienRuleTable::standard())?;
    if seeded > 0 {
        info!(rules = seeded, "seeded lien rules");
    }
    Ok(())
}

/// Current schema version, 0 when the database is fresh.
fn schema_version(conn: &Connection) -> Result<i32, RepositoryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let mut stmt = conn.prepare("SELECT version FROM schema_version LIMIT 1")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), RepositoryError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Inserts rules whose (rule type, project type) key is not present yet. Existing rows
/// are left alone so operators can tune them in place.
pub fn seed_lien_rules(conn: &Connection, table: &LienRuleTable) -> Result<usize, RepositoryError> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO lien_rules
            (rule_type, project_type, deadline_days, description, trigger_event, statutory_reference)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    let mut inserted = 0;
    for rule in table.rules() {
        inserted += stmt.execute(params![
            rule.rule_type,
            rule.project_type,
            rule.deadline_days,
            rule.description,
            rule.trigger_event,
            rule.statutory_reference,
        ])?;
    }
    Ok(inserted)
}

const TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    project_type TEXT NOT NULL CHECK (project_type IN ('private', 'public')),
    work_start_date TEXT,
    work_end_date TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lien_rules (
    rule_type TEXT NOT NULL,
    project_type TEXT NOT NULL CHECK (project_type IN ('private', 'public')),
    deadline_days INTEGER NOT NULL CHECK (deadline_days >= 0),
    description TEXT NOT NULL,
    trigger_event TEXT NOT NULL CHECK (trigger_event IN ('first_furnishing', 'completion')),
    statutory_reference TEXT NOT NULL,
    PRIMARY KEY (rule_type, project_type)
);

CREATE TABLE IF NOT EXISTS deadlines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
    deadline_type TEXT NOT NULL,
    deadline_date TEXT NOT NULL,
    trigger_date TEXT,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'completed', 'cancelled')),
    priority TEXT CHECK (priority IN ('low', 'normal', 'high', 'critical')),
    completed_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK ((status = 'completed') = (completed_date IS NOT NULL))
);

CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
    invoice_number TEXT NOT NULL,
    description TEXT,
    amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
    retainage_percent TEXT NOT NULL DEFAULT '0',
    retainage_cents INTEGER NOT NULL DEFAULT 0,
    amount_paid_cents INTEGER NOT NULL DEFAULT 0 CHECK (amount_paid_cents >= 0),
    payment_status TEXT NOT NULL DEFAULT 'pending'
        CHECK (payment_status IN ('pending', 'partial', 'paid')),
    invoice_date TEXT,
    due_date TEXT,
    paid_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_id INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    payment_date TEXT NOT NULL,
    amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
    payment_method TEXT,
    check_number TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);
"#;

const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id);
CREATE INDEX IF NOT EXISTS idx_deadlines_user_date ON deadlines(user_id, deadline_date);
CREATE INDEX IF NOT EXISTS idx_deadlines_project ON deadlines(project_id);
CREATE INDEX IF NOT EXISTS idx_invoices_user ON invoices(user_id);
CREATE INDEX IF NOT EXISTS idx_invoices_project ON invoices(project_id);
CREATE INDEX IF NOT EXISTS idx_payments_invoice ON payments(invoice_id, payment_date);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.pragma_update(None, "foreign_keys", true)
            .expect("foreign keys");
        init_schema(&conn).expect("schema");
        conn
    }

    #[test]
    fn fresh_database_is_seeded_with_standard_rules() {
        let conn = fresh();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM lien_rules", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 7);
    }

    #[test]
    fn reopening_keeps_version_and_does_not_duplicate_rules() {
        let conn = fresh();
        conn.execute(
            "UPDATE lien_rules SET deadline_days = 95
             WHERE rule_type = 'mechanics_lien' AND project_type = 'private'",
            [],
        )
        .expect("tune rule");

        init_schema(&conn).expect("second init");

        let version: i32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .expect("version");
        let days: i64 = conn
            .query_row(
                "SELECT deadline_days FROM lien_rules
                 WHERE rule_type = 'mechanics_lien' AND project_type = 'private'",
                [],
                |row| row.get(0),
            )
            .expect("days");
        assert_eq!(version, SCHEMA_VERSION);
        assert_eq!(days, 95);
    }

    #[test]
    fn completed_date_must_track_completed_status() {
        let conn = fresh();
        let result = conn.execute(
            "INSERT INTO deadlines
                (user_id, deadline_type, deadline_date, title, status, completed_date,
                 created_at, updated_at)
             VALUES ('u1', 'custom', '2025-01-01', 'x', 'pending', '2025-01-01', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
