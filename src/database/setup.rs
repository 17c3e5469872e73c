use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

use super::models::DATABASE_SCHEMA_VERSION;

/// Creates missing tables and stamps the schema version.
///
/// Refuses to touch a database written by a newer schema.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let current = read_user_version(conn)?;
    if current > DATABASE_SCHEMA_VERSION {
        anyhow::bail!(
            "Database schema version {} is newer than supported version {}",
            current,
            DATABASE_SCHEMA_VERSION
        );
    }

    let schema_sql = include_str!("schema.sql");
    let statements = split_sql_statements(schema_sql);

    for (idx, statement) in statements.iter().enumerate() {
        execute_sql(conn, statement)
            .with_context(|| format!("Failed to execute statement {}", idx + 1))?;
    }

    write_user_version(conn, DATABASE_SCHEMA_VERSION)?;

    if current < DATABASE_SCHEMA_VERSION {
        info!("Database schema created (version {})", DATABASE_SCHEMA_VERSION);
    }
    Ok(())
}

fn read_user_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to read database schema version")
}

fn write_user_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {};", version))
        .context("Failed to write database schema version")
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn execute_sql(conn: &Connection, sql: &str) -> Result<()> {
    conn.execute(sql, [])
        .context("Failed to execute SQL statement")
        .map(|_| ())
}
