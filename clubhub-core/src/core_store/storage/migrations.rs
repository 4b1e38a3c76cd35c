//! Database migrations for the club, event and user collections
//!
//! Each migration is applied atomically and tracked in the
//! `clubhub_schema_version` table.

use crate::core_store::errors::{StoreError, StoreResult};
use crate::core_store::types;
use rusqlite::{params, Connection, OptionalExtension};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial users, clubs and events schema",
        up_sql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,                    -- UserId (hyphenated uuid)
                email TEXT NOT NULL UNIQUE,             -- normalised lower-case
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,            -- argon2 PHC string
                institute_id TEXT NOT NULL,
                can_create_club INTEGER NOT NULL DEFAULT 0,
                is_admin INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS clubs (
                id TEXT PRIMARY KEY,
                club_name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                creator_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                creator_id TEXT NOT NULL,
                club_id TEXT NOT NULL,                  -- parent club, not enforced
                start_time INTEGER NOT NULL,
                end_time INTEGER NOT NULL,
                venue TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_club ON events(club_id);
            CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_time, created_at);

            CREATE TABLE IF NOT EXISTS user_followed_clubs (
                user_id TEXT NOT NULL,
                club_id TEXT NOT NULL,
                followed_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, club_id)
            );

            CREATE INDEX IF NOT EXISTS idx_followed_club ON user_followed_clubs(club_id);

            CREATE TABLE IF NOT EXISTS user_memberships (
                user_id TEXT NOT NULL,
                club_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('member', 'vice-president', 'president')),
                joined_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, club_id)
            );

            CREATE INDEX IF NOT EXISTS idx_memberships_club ON user_memberships(club_id);

            CREATE TABLE IF NOT EXISTS user_created_events (
                user_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, event_id)
            );

            CREATE INDEX IF NOT EXISTS idx_created_events_event ON user_created_events(event_id);

            CREATE TABLE IF NOT EXISTS event_organisers (
                event_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                added_at INTEGER NOT NULL,
                PRIMARY KEY (event_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_organisers_user ON event_organisers(user_id);
        "#,
    }]
}

fn ensure_version_table(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS clubhub_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get current schema version from database
pub fn current_version(conn: &Connection) -> StoreResult<i32> {
    ensure_version_table(conn)?;

    let version: Option<i32> = conn
        .query_row(
            "SELECT version FROM clubhub_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations, returning how many were applied
pub fn migrate(conn: &mut Connection) -> StoreResult<usize> {
    let current = current_version(conn)?;
    if current > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{} is newer than this build (v{})",
            current, CURRENT_SCHEMA_VERSION
        )));
    }

    let pending: Vec<_> = get_migrations().into_iter().filter(|m| m.version > current).collect();
    let applied = pending.len();

    for migration in pending {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.up_sql).map_err(|e| {
            StoreError::Migration(format!("v{} ({}): {}", migration.version, migration.description, e))
        })?;
        tx.execute(
            "INSERT INTO clubhub_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, types::to_millis(&types::now())],
        )?;
        tx.commit()?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "Applied schema migration"
        );
    }

    Ok(applied)
}

/// Get the latest migration version available
pub fn latest_version() -> i32 {
    get_migrations().iter().map(|m| m.version).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_initial_migration() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), 1);

        let tables = table_names(&conn);
        for expected in [
            "users",
            "clubs",
            "events",
            "user_followed_clubs",
            "user_memberships",
            "user_created_events",
            "event_organisers",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_migration_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), 0);
        assert_eq!(current_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_latest_version_matches_current() {
        assert_eq!(latest_version(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO clubhub_schema_version (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
