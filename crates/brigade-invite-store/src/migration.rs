//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use brigade_invite_core::{Clock, SystemClock};

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        // Another handle may have migrated while we waited for the write lock.
        let current: u32 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, SystemClock.now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Credentials: codes and links share one table and one use counter
        CREATE TABLE credentials (
            credential_id TEXT PRIMARY KEY,       -- 16 bytes, hex
            kitchen_id TEXT NOT NULL,
            kind INTEGER NOT NULL,                -- 0=code, 1=link
            human_code TEXT,                      -- code kind only, uppercase
            token TEXT,                           -- link kind only
            short_code TEXT,                      -- link kind only, display
            issued_by TEXT,                       -- NULL = kitchen owner by default policy
            created_at INTEGER NOT NULL,          -- Unix ms
            expires_at INTEGER NOT NULL,          -- Unix ms, exclusive
            max_uses INTEGER NOT NULL,
            current_uses INTEGER NOT NULL DEFAULT 0,
            revoked INTEGER NOT NULL DEFAULT 0,

            CHECK (current_uses >= 0 AND current_uses <= max_uses),
            CHECK ((kind = 0 AND human_code IS NOT NULL AND token IS NULL)
                OR (kind = 1 AND token IS NOT NULL AND human_code IS NULL)),
            UNIQUE (kitchen_id, human_code),
            UNIQUE (token)
        );

        -- Memberships: exactly one per (kitchen, user)
        CREATE TABLE memberships (
            kitchen_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            role INTEGER NOT NULL,                -- 0=owner, 1=admin, 2=member
            can_invite INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (kitchen_id, user_id)
        );

        -- Indexes for common queries
        CREATE INDEX idx_credentials_human_code ON credentials(human_code);
        CREATE INDEX idx_credentials_kitchen ON credentials(kitchen_id, created_at);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"credentials".to_string()));
        assert!(tables.contains(&"memberships".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_unreadable_version_is_an_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_migrations (version TEXT, applied_at INTEGER);
             INSERT INTO schema_migrations VALUES ('garbage', 0);",
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Database(_))));

        let credentials: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'credentials'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(credentials, 0);
    }

    #[test]
    fn test_use_count_check_constraint() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let over_cap = conn.execute(
            "INSERT INTO credentials (credential_id, kitchen_id, kind, human_code, created_at,
                                      expires_at, max_uses, current_uses)
             VALUES ('aa', 'k', 0, 'ABC234', 0, 10, 1, 2)",
            [],
        );
        assert!(over_cap.is_err());
    }
}
