//! SQLite schema for the citation store.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> SqliteResult<()> {
    // WAL for concurrent page processing against one store file.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        apply_v1_schema(conn)?;
    }

    Ok(())
}

fn apply_v1_schema(conn: &Connection) -> SqliteResult<()> {
    // Quote + accuracy rows, one per (page, footnote). The long-lived row
    // everything else derives from.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS citation_quotes (
            page_id TEXT NOT NULL,
            footnote INTEGER NOT NULL,
            claim TEXT NOT NULL,
            quote TEXT,
            quote_location TEXT,
            verification_method TEXT,
            verification_score REAL,
            verdict TEXT,
            accuracy_score REAL,
            issues TEXT,
            supporting_quotes TEXT,
            difficulty TEXT,
            source_url TEXT,
            source_title TEXT,
            checked_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (page_id, footnote)
        )",
        [],
    )?;

    // Fetched-page cache keyed by URL, shared across pages citing the same
    // source. Last fetch wins.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS content_cache (
            url TEXT PRIMARY KEY,
            html TEXT,
            text_content TEXT,
            title TEXT,
            status INTEGER,
            content_hash TEXT,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Audit trail of automated edits.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS edit_log (
            id TEXT PRIMARY KEY,
            page_id TEXT NOT NULL,
            tool TEXT NOT NULL,
            agency TEXT NOT NULL,
            note TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quotes_page ON citation_quotes(page_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quotes_verdict ON citation_quotes(verdict)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_edit_log_page ON edit_log(page_id)",
        [],
    )?;

    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Check whether the schema has been initialized.
pub fn is_initialized(conn: &Connection) -> bool {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='citation_quotes'",
        [],
        |_| Ok(()),
    )
    .is_ok()
}
