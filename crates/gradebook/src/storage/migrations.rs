//! Database migration system for gradebook.
//!
//! The base schema is created idempotently on every open; numbered migrations
//! then bring an older database forward. The applied version lives in the
//! `metadata` table.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Statements for each migration, indexed by target version.
const MIGRATIONS: &[(i32, &[&str])] = &[
    // v1 is the base schema itself.
    (1, &[]),
];

/// Initialize the database schema.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for target in (version + 1)..=CURRENT_VERSION {
        apply_migration(conn, target)?;
    }

    if version < CURRENT_VERSION {
        info!("Migrated database schema from v{} to v{}", version, CURRENT_VERSION);
    }
    Ok(())
}

/// Read the applied schema version. Returns 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Apply a single migration and record its version, atomically.
fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    let statements = MIGRATIONS
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, statements)| *statements)
        .ok_or_else(|| Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        })?;

    debug!("Applying schema migration v{}", version);
    let tx = conn.unchecked_transaction()?;
    for statement in statements {
        tx.execute(statement, [])?;
    }
    set_schema_version(&tx, version)?;
    tx.commit()?;
    Ok(())
}
