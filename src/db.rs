use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("gradecalc.sqlite3");
    let conn = Connection::open(db_path)?;
    ensure_app_state(&conn)?;
    Ok(conn)
}

pub(crate) fn ensure_app_state(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    Ok(())
}

/// Read one slot. The stored text is parsed as JSON here; a slot that fails to
/// parse surfaces as an error for the caller to decide on.
pub fn state_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM app_state WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Upsert one slot. `updated_at` is row metadata; the value itself carries no
/// envelope.
pub fn state_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO app_state(key, value, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, &text, &now),
    )?;
    Ok(())
}
