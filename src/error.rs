use std::path::PathBuf;

use crate::game::MoveError;

/// Errors raised while decoding a persisted game state.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("malformed game state: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported game state version {0}")]
    UnsupportedVersion(u32),

    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cell value {value} at row {row}, column {col} is out of range")]
    CellValue { row: usize, col: usize, value: u8 },

    #[error("piece at row {row}, column {col} is not supported from below")]
    FloatingPiece { row: usize, col: usize },

    #[error("piece counts {one} and {two} cannot come from alternating turns")]
    PieceBalance { one: usize, two: usize },

    #[error("active rows {0} outside the playable range")]
    ActiveRows(usize),

    #[error("cell at row {row}, column {col} lies above the ceiling")]
    AboveCeiling { row: usize, col: usize },

    #[error("both players have a winning run")]
    DoubleWin,

    #[error("match count {0} is out of range")]
    MatchCount(u32),

    #[error("scores {score_p1} and {score_p2} cannot come from {match_count} matches")]
    ScoreTotal {
        match_count: u32,
        score_p1: u32,
        score_p2: u32,
    },

    #[error("game marked finished while columns are still open")]
    FinishedWhileOpen,
}

/// Errors returned by session and account stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key '{0}' already exists")]
    DuplicateKey(String),

    #[error("no record for key '{0}'")]
    NotFound(String),

    #[error("record '{0}' was modified concurrently")]
    Conflict(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced to a participant of a networked game.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid move: {0}")]
    InvalidMove(MoveError),

    #[error("'{0}' is already taken")]
    DuplicateKey(String),

    #[error("room '{0}' no longer exists")]
    SessionNotFound(String),

    #[error("wrong credentials")]
    AuthFailure,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("the game is over")]
    GameOver,

    #[error("room '{0}' is not accepting players")]
    RoomUnavailable(String),

    #[error("room id and password must not be empty")]
    InvalidRoom,

    #[error("room '{0}' changed while the move was being written")]
    Conflict(String),

    #[error("gave up waiting after {0:?}")]
    TimedOut(std::time::Duration),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("stored game state is invalid: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] argon2::password_hash::Error),
}

impl From<MoveError> for SessionError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::GameOver => SessionError::GameOver,
            other => SessionError::InvalidMove(other),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(key) => SessionError::DuplicateKey(key),
            StoreError::NotFound(key) => SessionError::SessionNotFound(key),
            StoreError::Conflict(key) => SessionError::Conflict(key),
            other => SessionError::Store(other),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
