//! Persistence for session records and accounts.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::game::GameKind;

use super::snapshot::GameSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Playing,
    Finished,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::Playing => "playing",
            SessionStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(SessionStatus::Waiting),
            "playing" => Ok(SessionStatus::Playing),
            "finished" => Ok(SessionStatus::Finished),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

impl ToSql for SessionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SessionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// The shared record both participants of a room read and write.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub room_id: String,
    pub password_hash: String,
    pub host_id: String,
    pub guest_id: Option<String>,
    pub turn_owner: Option<String>,
    pub snapshot: GameSnapshot,
    pub status: SessionStatus,
    pub updated_at: DateTime<Utc>,
    /// Incremented by the store on every accepted update.
    pub version: u64,
}

/// Lobby entry for a room that is waiting for a guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: String,
    pub host_id: String,
    pub kind: GameKind,
}

impl From<&SessionRecord> for RoomSummary {
    fn from(record: &SessionRecord) -> Self {
        RoomSummary {
            room_id: record.room_id.clone(),
            host_id: record.host_id.clone(),
            kind: record.snapshot.kind(),
        }
    }
}

pub trait SessionStore {
    /// Insert a new record. Fails with `DuplicateKey` if the room exists.
    fn create(&self, record: &SessionRecord) -> Result<(), StoreError>;

    fn read(&self, room_id: &str) -> Result<SessionRecord, StoreError>;

    /// Overwrite the record if its stored version still equals
    /// `expected_version`. Returns the new version.
    fn update(&self, record: &SessionRecord, expected_version: u64) -> Result<u64, StoreError>;

    fn delete(&self, room_id: &str) -> Result<(), StoreError>;

    /// Rooms in `Waiting` status, ordered by room id.
    fn list_waiting(&self) -> Result<Vec<RoomSummary>, StoreError>;
}

pub trait AccountStore {
    /// Fails with `DuplicateKey` if the username is taken.
    fn create_account(&self, username: &str, password_hash: &str) -> Result<(), StoreError>;

    fn password_hash(&self, username: &str) -> Result<Option<String>, StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process store for tests and single-machine play.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: Mutex<HashMap<String, SessionRecord>>,
    accounts: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn create(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let mut rooms = lock(&self.rooms);
        if rooms.contains_key(&record.room_id) {
            return Err(StoreError::DuplicateKey(record.room_id.clone()));
        }
        rooms.insert(record.room_id.clone(), record.clone());
        Ok(())
    }

    fn read(&self, room_id: &str) -> Result<SessionRecord, StoreError> {
        lock(&self.rooms)
            .get(room_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(room_id.to_string()))
    }

    fn update(&self, record: &SessionRecord, expected_version: u64) -> Result<u64, StoreError> {
        let mut rooms = lock(&self.rooms);
        let stored = rooms
            .get_mut(&record.room_id)
            .ok_or_else(|| StoreError::NotFound(record.room_id.clone()))?;
        if stored.version != expected_version {
            return Err(StoreError::Conflict(record.room_id.clone()));
        }
        *stored = SessionRecord {
            updated_at: Utc::now(),
            version: expected_version + 1,
            ..record.clone()
        };
        Ok(stored.version)
    }

    fn delete(&self, room_id: &str) -> Result<(), StoreError> {
        lock(&self.rooms)
            .remove(room_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(room_id.to_string()))
    }

    fn list_waiting(&self) -> Result<Vec<RoomSummary>, StoreError> {
        let rooms = lock(&self.rooms);
        let mut waiting: Vec<RoomSummary> = rooms
            .values()
            .filter(|record| record.status == SessionStatus::Waiting)
            .map(RoomSummary::from)
            .collect();
        waiting.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        Ok(waiting)
    }
}

impl AccountStore for MemoryStore {
    fn create_account(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let mut accounts = lock(&self.accounts);
        if accounts.contains_key(username) {
            return Err(StoreError::DuplicateKey(username.to_string()));
        }
        accounts.insert(username.to_string(), password_hash.to_string());
        Ok(())
    }

    fn password_hash(&self, username: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.accounts).get(username).cloned())
    }
}

/// SQLite-backed store shared by processes on one machine.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS rooms (
    room_id TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    host_id TEXT NOT NULL,
    guest_id TEXT,
    turn_owner TEXT,
    game_state TEXT NOT NULL,
    status TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rooms_status ON rooms(status);
"#;

const SELECT_ROOM: &str = "SELECT room_id, password_hash, host_id, guest_id, turn_owner, \
     game_state, status, updated_at, version FROM rooms WHERE room_id = ?1";

/// Columns of a `rooms` row before the game state and timestamp are parsed.
struct RoomRow {
    room_id: String,
    password_hash: String,
    host_id: String,
    guest_id: Option<String>,
    turn_owner: Option<String>,
    game_state: String,
    status: SessionStatus,
    updated_at: String,
    version: i64,
}

impl RoomRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(RoomRow {
            room_id: row.get(0)?,
            password_hash: row.get(1)?,
            host_id: row.get(2)?,
            guest_id: row.get(3)?,
            turn_owner: row.get(4)?,
            game_state: row.get(5)?,
            status: row.get(6)?,
            updated_at: row.get(7)?,
            version: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<SessionRecord, StoreError> {
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
        Ok(SessionRecord {
            room_id: self.room_id,
            password_hash: self.password_hash,
            host_id: self.host_id,
            guest_id: self.guest_id,
            turn_owner: self.turn_owner,
            snapshot: GameSnapshot::from_json(&self.game_state)?,
            status: self.status,
            updated_at,
            version: self.version as u64,
        })
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl SqliteStore {
    /// Open (or create) a database file and initialize its tables.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let conn = lock(&self.conn);
        let result = conn.execute(
            "INSERT INTO rooms (room_id, password_hash, host_id, guest_id, turn_owner,
                                game_state, status, updated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.room_id,
                record.password_hash,
                record.host_id,
                record.guest_id,
                record.turn_owner,
                record.snapshot.to_json()?,
                record.status,
                record.updated_at.to_rfc3339(),
                record.version as i64,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::DuplicateKey(record.room_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self, room_id: &str) -> Result<SessionRecord, StoreError> {
        let conn = lock(&self.conn);
        let row = conn
            .query_row(SELECT_ROOM, params![room_id], RoomRow::from_row)
            .optional()?;
        row.ok_or_else(|| StoreError::NotFound(room_id.to_string()))?
            .into_record()
    }

    fn update(&self, record: &SessionRecord, expected_version: u64) -> Result<u64, StoreError> {
        let conn = lock(&self.conn);
        let next = expected_version + 1;
        let changed = conn.execute(
            "UPDATE rooms SET password_hash = ?1, host_id = ?2, guest_id = ?3, turn_owner = ?4,
                              game_state = ?5, status = ?6, updated_at = ?7, version = ?8
             WHERE room_id = ?9 AND version = ?10",
            params![
                record.password_hash,
                record.host_id,
                record.guest_id,
                record.turn_owner,
                record.snapshot.to_json()?,
                record.status,
                Utc::now().to_rfc3339(),
                next as i64,
                record.room_id,
                expected_version as i64,
            ],
        )?;
        if changed == 1 {
            return Ok(next);
        }
        let exists: Option<i64> = conn
            .query_row(
                "SELECT version FROM rooms WHERE room_id = ?1",
                params![record.room_id],
                |row| row.get(0),
            )
            .optional()?;
        match exists {
            Some(version) => {
                debug!(
                    "room {} is at version {version}, expected {expected_version}",
                    record.room_id
                );
                Err(StoreError::Conflict(record.room_id.clone()))
            }
            None => Err(StoreError::NotFound(record.room_id.clone())),
        }
    }

    fn delete(&self, room_id: &str) -> Result<(), StoreError> {
        let conn = lock(&self.conn);
        let removed = conn.execute("DELETE FROM rooms WHERE room_id = ?1", params![room_id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(room_id.to_string()));
        }
        Ok(())
    }

    fn list_waiting(&self) -> Result<Vec<RoomSummary>, StoreError> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT room_id, host_id, game_state FROM rooms WHERE status = ?1 ORDER BY room_id",
        )?;
        let rows = stmt
            .query_map(params![SessionStatus::Waiting], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let waiting = rows
            .into_iter()
            .filter_map(|(room_id, host_id, game_state)| {
                match GameSnapshot::from_json(&game_state) {
                    Ok(snapshot) => Some(RoomSummary {
                        room_id,
                        host_id,
                        kind: snapshot.kind(),
                    }),
                    Err(e) => {
                        warn!("skipping room {room_id} with unreadable game state: {e}");
                        None
                    }
                }
            })
            .collect();
        Ok(waiting)
    }
}

impl AccountStore for SqliteStore {
    fn create_account(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let conn = lock(&self.conn);
        let result = conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, Utc::now().to_rfc3339()],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => {
                Err(StoreError::DuplicateKey(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn password_hash(&self, username: &str) -> Result<Option<String>, StoreError> {
        let conn = lock(&self.conn);
        let hash = conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }
}
