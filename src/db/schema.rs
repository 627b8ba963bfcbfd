use anyhow::{Context, Result};
use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    tech_stack TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS features (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    size TEXT NOT NULL,
    risk TEXT NOT NULL,
    business_value INTEGER NOT NULL,
    wow_factor INTEGER NOT NULL DEFAULT 0,
    category TEXT NOT NULL DEFAULT 'Logic',
    position INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_features_project ON features(project_id, position);
";

/// Create tables if they don't exist. Safe to call on every start.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("Failed to enable foreign keys")?;
    conn.execute_batch(SCHEMA)
        .context("Failed to create schema")?;
    tracing::debug!("Database schema ready");
    Ok(())
}
