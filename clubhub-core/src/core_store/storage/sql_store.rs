//! SQLite-backed storage for users, clubs and events
//!
//! `ClubStore` owns the connection pool. All access goes through
//! [`ClubStore::read`] or [`ClubStore::write`], which hand a [`Collections`]
//! view bound to a single transaction to the caller. Multi-collection updates
//! therefore commit or roll back as a unit.

use super::migrations;
use crate::config::StoreConfig;
use crate::core_store::errors::{StoreError, StoreResult};
use crate::core_store::model::{
    Club, ClubRole, Event, EventListing, Membership, OrganiserInfo, User,
};
use crate::core_store::types::{self, ClubId, EventId, Timestamp, UserId};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

const MEMORY_URL: &str = ":memory:";

macro_rules! sql_id {
    ($($name:ident),+) => {$(
        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.to_string()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    )+};
}

sql_id!(UserId, ClubId, EventId);

impl ToSql for ClubRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ClubRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    let ms: i64 = row.get(idx)?;
    types::from_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

/// Handle to the club database
#[derive(Clone)]
pub struct ClubStore {
    pool: Pool<SqliteConnectionManager>,
    in_memory: bool,
}

impl std::fmt::Debug for ClubStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClubStore")
            .field("in_memory", &self.in_memory)
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl ClubStore {
    /// Open the database named by `config`, creating and migrating it as needed
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let location = parse_database_url(&config.database_url)?;
        let busy_timeout = config.busy_timeout;

        if location == MEMORY_URL {
            let manager = SqliteConnectionManager::memory()
                .with_init(move |conn| conn.busy_timeout(busy_timeout));
            // every pooled connection to :memory: is a separate database
            return Self::build(manager, 1, true);
        }

        let path = Path::new(location);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")
        });

        tracing::info!(path = %path.display(), pool_size = config.pool_size, "Opening club store");
        Self::build(manager, config.pool_size.max(1), false)
    }

    /// Create a fresh in-memory store
    pub fn memory() -> StoreResult<Self> {
        Self::open(&StoreConfig {
            database_url: MEMORY_URL.to_string(),
            pool_size: 1,
            busy_timeout: Duration::from_secs(5),
        })
    }

    fn build(manager: SqliteConnectionManager, pool_size: u32, in_memory: bool) -> StoreResult<Self> {
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        {
            let mut conn = pool.get()?;
            migrations::migrate(&mut conn)?;
        }

        Ok(Self { pool, in_memory })
    }

    fn connection(&self) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Run `f` against a consistent snapshot of the collections
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Collections<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(StoreError::from)?;
        let out = f(&Collections { conn: &tx });
        out
    }

    /// Run `f` inside a write transaction; commits on `Ok`, rolls back on `Err`
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Collections<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let out = f(&Collections { conn: &tx })?;
        tx.commit().map_err(StoreError::from)?;
        Ok(out)
    }

    /// Round-trip a trivial query, returning how long it took
    pub fn ping(&self) -> StoreResult<Duration> {
        let started = Instant::now();
        let conn = self.connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(started.elapsed())
    }

    /// Flush the write-ahead log before the process exits
    pub fn close(&self) -> StoreResult<()> {
        if self.in_memory {
            return Ok(());
        }
        let conn = self.connection()?;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        tracing::info!("Club store checkpointed");
        Ok(())
    }
}

fn parse_database_url(url: &str) -> StoreResult<&str> {
    let trimmed = url.trim();
    let location = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);

    if location.is_empty() {
        return Err(StoreError::InvalidUrl(url.to_string()));
    }
    Ok(location)
}

/// The three collections, viewed through one open transaction
pub struct Collections<'c> {
    conn: &'c Connection,
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, institute_id, can_create_club, is_admin, created_at";

const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.creator_id, e.club_id, \
     e.start_time, e.end_time, e.venue, e.created_at, e.updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        institute_id: row.get(4)?,
        following_clubs: Vec::new(),
        memberships: Vec::new(),
        events_created: Vec::new(),
        can_create_club: row.get(5)?,
        is_admin: row.get(6)?,
        created_at: timestamp_at(row, 7)?,
    })
}

fn club_from_row(row: &Row<'_>) -> rusqlite::Result<Club> {
    Ok(Club {
        id: row.get(0)?,
        club_name: row.get(1)?,
        description: row.get(2)?,
        creator: row.get(3)?,
        created_at: timestamp_at(row, 4)?,
        updated_at: timestamp_at(row, 5)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        creator: row.get(3)?,
        of_club: row.get(4)?,
        start_time: timestamp_at(row, 5)?,
        end_time: timestamp_at(row, 6)?,
        venue: row.get(7)?,
        organisers: Vec::new(),
        created_at: timestamp_at(row, 8)?,
        updated_at: timestamp_at(row, 9)?,
    })
}

impl<'c> Collections<'c> {
    // ===== Users =====

    /// Insert a user together with any set entries it already carries
    pub fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.conn.execute(
            &format!("INSERT INTO users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)", USER_COLUMNS),
            params![
                user.id,
                user.email,
                user.name,
                user.password_hash,
                user.institute_id,
                user.can_create_club,
                user.is_admin,
                types::to_millis(&user.created_at),
            ],
        )?;

        for club_id in &user.following_clubs {
            self.add_following(&user.id, club_id)?;
        }
        for membership in &user.memberships {
            self.add_membership(&user.id, &membership.club_id, membership.role)?;
        }
        for event_id in &user.events_created {
            self.add_created_event(&user.id, event_id)?;
        }
        Ok(())
    }

    pub fn find_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()?;

        user.map(|u| self.with_user_sets(u)).transpose()
    }

    /// Look a user up by normalised email
    pub fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![email],
                user_from_row,
            )
            .optional()?;

        user.map(|u| self.with_user_sets(u)).transpose()
    }

    fn with_user_sets(&self, mut user: User) -> StoreResult<User> {
        let mut stmt = self
            .conn
            .prepare("SELECT club_id FROM user_followed_clubs WHERE user_id = ? ORDER BY rowid")?;
        user.following_clubs = stmt
            .query_map(params![user.id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT club_id, role FROM user_memberships WHERE user_id = ? ORDER BY rowid",
        )?;
        user.memberships = stmt
            .query_map(params![user.id], |row| {
                Ok(Membership {
                    club_id: row.get(0)?,
                    role: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT event_id FROM user_created_events WHERE user_id = ? ORDER BY rowid",
        )?;
        user.events_created = stmt
            .query_map(params![user.id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        Ok(user)
    }

    /// Every user with their sets, in registration order
    pub fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at, rowid",
            USER_COLUMNS
        ))?;
        let mut users: Vec<User> =
            stmt.query_map([], user_from_row)?.collect::<Result<_, _>>()?;

        let index: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, u)| (u.id, i)).collect();

        let mut stmt =
            self.conn.prepare("SELECT user_id, club_id FROM user_followed_clubs ORDER BY rowid")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let user_id: UserId = row.get(0)?;
            if let Some(&i) = index.get(&user_id) {
                users[i].following_clubs.push(row.get(1)?);
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT user_id, club_id, role FROM user_memberships ORDER BY rowid")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let user_id: UserId = row.get(0)?;
            if let Some(&i) = index.get(&user_id) {
                users[i].memberships.push(Membership {
                    club_id: row.get(1)?,
                    role: row.get(2)?,
                });
            }
        }

        let mut stmt =
            self.conn.prepare("SELECT user_id, event_id FROM user_created_events ORDER BY rowid")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let user_id: UserId = row.get(0)?;
            if let Some(&i) = index.get(&user_id) {
                users[i].events_created.push(row.get(1)?);
            }
        }

        Ok(users)
    }

    /// Returns `true` if the club was not already followed
    pub fn add_following(&self, user_id: &UserId, club_id: &ClubId) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO user_followed_clubs (user_id, club_id, followed_at) VALUES (?, ?, ?)",
            params![user_id, club_id, types::to_millis(&types::now())],
        )?;
        Ok(inserted > 0)
    }

    pub fn remove_following(&self, user_id: &UserId, club_id: &ClubId) -> StoreResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM user_followed_clubs WHERE user_id = ? AND club_id = ?",
            params![user_id, club_id],
        )?;
        Ok(removed > 0)
    }

    /// Record a membership; an existing membership in the same club is kept as is
    pub fn add_membership(
        &self,
        user_id: &UserId,
        club_id: &ClubId,
        role: ClubRole,
    ) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO user_memberships (user_id, club_id, role, joined_at) VALUES (?, ?, ?, ?)",
            params![user_id, club_id, role, types::to_millis(&types::now())],
        )?;
        Ok(inserted > 0)
    }

    pub fn add_created_event(&self, user_id: &UserId, event_id: &EventId) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO user_created_events (user_id, event_id, created_at) VALUES (?, ?, ?)",
            params![user_id, event_id, types::to_millis(&types::now())],
        )?;
        Ok(inserted > 0)
    }

    pub fn remove_created_event(&self, user_id: &UserId, event_id: &EventId) -> StoreResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM user_created_events WHERE user_id = ? AND event_id = ?",
            params![user_id, event_id],
        )?;
        Ok(removed > 0)
    }

    /// Drop the club from every user's membership set
    pub fn pull_club_from_memberships(&self, club_id: &ClubId) -> StoreResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM user_memberships WHERE club_id = ?", params![club_id])?)
    }

    /// Drop the club from every user's follow set
    pub fn pull_club_from_follows(&self, club_id: &ClubId) -> StoreResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM user_followed_clubs WHERE club_id = ?", params![club_id])?)
    }

    /// Names of the clubs the user is a member of; dangling references are skipped
    pub fn membership_club_names(&self, user_id: &UserId) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.club_name FROM user_memberships m
             JOIN clubs c ON c.id = m.club_id
             WHERE m.user_id = ? ORDER BY m.rowid",
        )?;
        let names = stmt.query_map(params![user_id], |row| row.get(0))?.collect::<Result<_, _>>()?;
        Ok(names)
    }

    /// Names of the clubs the user follows; dangling references are skipped
    pub fn followed_club_names(&self, user_id: &UserId) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.club_name FROM user_followed_clubs f
             JOIN clubs c ON c.id = f.club_id
             WHERE f.user_id = ? ORDER BY f.rowid",
        )?;
        let names = stmt.query_map(params![user_id], |row| row.get(0))?.collect::<Result<_, _>>()?;
        Ok(names)
    }

    // ===== Clubs =====

    pub fn insert_club(&self, club: &Club) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO clubs (id, club_name, description, creator_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                club.id,
                club.club_name,
                club.description,
                club.creator,
                types::to_millis(&club.created_at),
                types::to_millis(&club.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_club(&self, id: &ClubId) -> StoreResult<Option<Club>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, club_name, description, creator_id, created_at, updated_at
                 FROM clubs WHERE id = ?",
                params![id],
                club_from_row,
            )
            .optional()?)
    }

    pub fn find_club_by_name(&self, club_name: &str) -> StoreResult<Option<Club>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, club_name, description, creator_id, created_at, updated_at
                 FROM clubs WHERE club_name = ?",
                params![club_name],
                club_from_row,
            )
            .optional()?)
    }

    pub fn list_clubs(&self) -> StoreResult<Vec<Club>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, club_name, description, creator_id, created_at, updated_at
             FROM clubs ORDER BY created_at, rowid",
        )?;
        let clubs = stmt.query_map([], club_from_row)?.collect::<Result<_, _>>()?;
        Ok(clubs)
    }

    pub fn delete_club(&self, id: &ClubId) -> StoreResult<bool> {
        let removed = self.conn.execute("DELETE FROM clubs WHERE id = ?", params![id])?;
        Ok(removed > 0)
    }

    // ===== Events =====

    /// Insert an event and its organiser list
    pub fn insert_event(&self, event: &Event) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO events (id, title, description, creator_id, club_id, start_time, end_time, venue, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                event.id,
                event.title,
                event.description,
                event.creator,
                event.of_club,
                types::to_millis(&event.start_time),
                types::to_millis(&event.end_time),
                event.venue,
                types::to_millis(&event.created_at),
                types::to_millis(&event.updated_at),
            ],
        )?;

        for organiser in &event.organisers {
            self.add_organiser(&event.id, organiser)?;
        }
        Ok(())
    }

    pub fn find_event(&self, id: &EventId) -> StoreResult<Option<Event>> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {} FROM events e WHERE e.id = ?", EVENT_COLUMNS),
                params![id],
                event_from_row,
            )
            .optional()?;

        let Some(mut event) = event else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT user_id FROM event_organisers WHERE event_id = ? ORDER BY added_at, rowid",
        )?;
        event.organisers = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        Ok(Some(event))
    }

    /// All events by start time, with club, creator and organiser names resolved
    pub fn list_event_listings(&self) -> StoreResult<Vec<EventListing>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, c.club_name, u.name
             FROM events e
             LEFT JOIN clubs c ON c.id = e.club_id
             LEFT JOIN users u ON u.id = e.creator_id
             ORDER BY e.start_time ASC, e.created_at ASC, e.rowid ASC",
            EVENT_COLUMNS
        ))?;
        let mut listings: Vec<EventListing> = stmt
            .query_map([], |row| {
                Ok(EventListing {
                    event: event_from_row(row)?,
                    club_name: row.get(10)?,
                    creator_name: row.get(11)?,
                    organiser_details: Vec::new(),
                })
            })?
            .collect::<Result<_, _>>()?;

        let index: HashMap<EventId, usize> =
            listings.iter().enumerate().map(|(i, l)| (l.event.id, i)).collect();

        let mut stmt = self.conn.prepare(
            "SELECT o.event_id, o.user_id, u.email, u.name
             FROM event_organisers o
             LEFT JOIN users u ON u.id = o.user_id
             ORDER BY o.added_at, o.rowid",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let event_id: EventId = row.get(0)?;
            let Some(&i) = index.get(&event_id) else {
                continue;
            };
            let listing = &mut listings[i];
            listing.event.organisers.push(row.get(1)?);

            let email: Option<String> = row.get(2)?;
            let name: Option<String> = row.get(3)?;
            if let (Some(email), Some(name)) = (email, name) {
                listing.organiser_details.push(OrganiserInfo { email, name });
            }
        }

        Ok(listings)
    }

    /// `(event, creator)` pairs for every event owned by the club
    pub fn events_of_club(&self, club_id: &ClubId) -> StoreResult<Vec<(EventId, UserId)>> {
        let mut stmt =
            self.conn.prepare("SELECT id, creator_id FROM events WHERE club_id = ? ORDER BY rowid")?;
        let pairs = stmt
            .query_map(params![club_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;
        Ok(pairs)
    }

    /// Delete an event and its organiser rows
    pub fn delete_event(&self, id: &EventId) -> StoreResult<bool> {
        self.conn.execute("DELETE FROM event_organisers WHERE event_id = ?", params![id])?;
        let removed = self.conn.execute("DELETE FROM events WHERE id = ?", params![id])?;
        Ok(removed > 0)
    }

    /// Returns `true` if the user was not already an organiser
    pub fn add_organiser(&self, event_id: &EventId, user_id: &UserId) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO event_organisers (event_id, user_id, added_at) VALUES (?, ?, ?)",
            params![event_id, user_id, types::to_millis(&types::now())],
        )?;
        Ok(inserted > 0)
    }

    pub fn remove_organiser(&self, event_id: &EventId, user_id: &UserId) -> StoreResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM event_organisers WHERE event_id = ? AND user_id = ?",
            params![event_id, user_id],
        )?;
        Ok(removed > 0)
    }

    /// Email and name of each organiser in the order they were added
    pub fn organiser_profiles(&self, event_id: &EventId) -> StoreResult<Vec<OrganiserInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.email, u.name FROM event_organisers o
             JOIN users u ON u.id = o.user_id
             WHERE o.event_id = ? ORDER BY o.added_at, o.rowid",
        )?;
        let organisers = stmt
            .query_map(params![event_id], |row| {
                Ok(OrganiserInfo {
                    email: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(organisers)
    }

    pub fn touch_event(&self, event_id: &EventId, at: Timestamp) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE events SET updated_at = ? WHERE id = ?",
            params![types::to_millis(&at), event_id],
        )?;
        Ok(())
    }
}
