use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS persons (
            id         TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            avatar_url TEXT
        );

        CREATE TABLE IF NOT EXISTS reminders (
            id               TEXT PRIMARY KEY,
            scope_id         TEXT NOT NULL,
            description      TEXT NOT NULL,
            date             TEXT NOT NULL,
            time             TEXT,
            recurrence_type  TEXT NOT NULL DEFAULT 'NONE',
            recurrence_day   INTEGER,
            target_audience  TEXT NOT NULL,
            assigned_user_id TEXT REFERENCES persons(id) ON DELETE SET NULL,
            is_acknowledged  INTEGER NOT NULL DEFAULT 0,
            deleted          INTEGER NOT NULL DEFAULT 0,
            created_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_rem_scope_date ON reminders(scope_id, date);
        CREATE INDEX IF NOT EXISTS idx_rem_group
            ON reminders(scope_id, description, recurrence_type, time);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
