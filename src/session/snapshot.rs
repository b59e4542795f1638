//! Wire format for game states stored in a session record.
//!
//! Boards are listed top row first. Every decoded blob is checked against
//! the rules of its game before it becomes a [`GameState`].

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::game::cascade::{CASCADE_COLS, CASCADE_MAX_ROWS, CASCADE_START_ROWS};
use crate::game::classic::{CLASSIC_COLS, CLASSIC_ROWS};
use crate::game::{
    CascadeGame, CascadeStatus, Cell, ClassicGame, GameKind, GameState, Grid, LineScanner,
    Player, RUN_LENGTH,
};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Upper bound on matches a stored Cascade game may claim.
pub const MAX_MATCH_COUNT: u32 = 10_000;

/// Serialized game state, tagged by game kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameSnapshot {
    Classic {
        version: u32,
        board: Vec<Vec<u8>>,
    },
    Cascade {
        version: u32,
        board: Vec<Vec<u8>>,
        active_rows: usize,
        match_count: u32,
        score_p1: u32,
        score_p2: u32,
        finished: bool,
    },
}

impl GameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        match state {
            GameState::Classic(game) => GameSnapshot::Classic {
                version: SNAPSHOT_VERSION,
                board: rows_of(game.board()),
            },
            GameState::Cascade(game) => GameSnapshot::Cascade {
                version: SNAPSHOT_VERSION,
                board: rows_of(game.board()),
                active_rows: game.active_rows(),
                match_count: game.match_count(),
                score_p1: game.score(Player::One),
                score_p2: game.score(Player::Two),
                finished: game.is_finished(),
            },
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            GameSnapshot::Classic { .. } => GameKind::Classic,
            GameSnapshot::Cascade { .. } => GameKind::Cascade,
        }
    }

    /// Validate the snapshot and rebuild the game it describes.
    pub fn to_state(&self) -> Result<GameState, SnapshotError> {
        match self {
            GameSnapshot::Classic { version, board } => {
                check_version(*version)?;
                let grid = grid_from::<CLASSIC_ROWS, CLASSIC_COLS>(board, 2)?;
                check_gravity(&grid)?;
                let one = grid.count(Player::One.to_cell());
                let two = grid.count(Player::Two.to_cell());
                if one < two || one > two + 1 {
                    return Err(SnapshotError::PieceBalance { one, two });
                }
                if LineScanner::has_run(&grid, Player::One, RUN_LENGTH)
                    && LineScanner::has_run(&grid, Player::Two, RUN_LENGTH)
                {
                    return Err(SnapshotError::DoubleWin);
                }
                Ok(GameState::Classic(ClassicGame::from_board(grid)))
            }
            GameSnapshot::Cascade {
                version,
                board,
                active_rows,
                match_count,
                score_p1,
                score_p2,
                finished,
            } => {
                check_version(*version)?;
                if !(CASCADE_START_ROWS..=CASCADE_MAX_ROWS).contains(active_rows) {
                    return Err(SnapshotError::ActiveRows(*active_rows));
                }
                let grid = grid_from::<CASCADE_MAX_ROWS, CASCADE_COLS>(board, 3)?;
                for row in *active_rows..CASCADE_MAX_ROWS {
                    if let Some(col) = (0..CASCADE_COLS).find(|&c| !grid.get(row, c).is_empty()) {
                        return Err(SnapshotError::AboveCeiling { row, col });
                    }
                }
                if *match_count > MAX_MATCH_COUNT {
                    return Err(SnapshotError::MatchCount(*match_count));
                }
                // One point per match, plus the closing bonus once finished.
                let points = u64::from(*score_p1) + u64::from(*score_p2);
                if points > u64::from(*match_count) + u64::from(*finished) {
                    return Err(SnapshotError::ScoreTotal {
                        match_count: *match_count,
                        score_p1: *score_p1,
                        score_p2: *score_p2,
                    });
                }
                let status = if *finished {
                    CascadeStatus::Finished
                } else {
                    CascadeStatus::Continue
                };
                let game = CascadeGame::from_parts(
                    grid,
                    *active_rows,
                    *match_count,
                    [*score_p1, *score_p2],
                    status,
                );
                if *finished && game.empty_cells() > 0 && !game.is_blocked() {
                    return Err(SnapshotError::FinishedWhileOpen);
                }
                Ok(GameState::Cascade(game))
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse JSON without validating the game it describes.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<&GameState> for GameSnapshot {
    fn from(state: &GameState) -> Self {
        GameSnapshot::capture(state)
    }
}

/// Parse and validate a JSON game state.
pub fn decode(json: &str) -> Result<GameState, SnapshotError> {
    GameSnapshot::from_json(json)?.to_state()
}

fn check_version(version: u32) -> Result<(), SnapshotError> {
    if version == SNAPSHOT_VERSION {
        Ok(())
    } else {
        Err(SnapshotError::UnsupportedVersion(version))
    }
}

fn rows_of<const R: usize, const C: usize>(grid: &Grid<R, C>) -> Vec<Vec<u8>> {
    (0..R)
        .rev()
        .map(|row| (0..C).map(|col| grid.get(row, col).code()).collect())
        .collect()
}

fn grid_from<const R: usize, const C: usize>(
    rows: &[Vec<u8>],
    max_code: u8,
) -> Result<Grid<R, C>, SnapshotError> {
    if rows.len() != R {
        return Err(SnapshotError::RowCount {
            expected: R,
            found: rows.len(),
        });
    }
    let mut grid = Grid::new();
    for (index, cells) in rows.iter().enumerate() {
        let row = R - 1 - index;
        if cells.len() != C {
            return Err(SnapshotError::RowLength {
                row,
                expected: C,
                found: cells.len(),
            });
        }
        for (col, &value) in cells.iter().enumerate() {
            let cell = Cell::from_code(value)
                .filter(|_| value <= max_code)
                .ok_or(SnapshotError::CellValue { row, col, value })?;
            grid.set(row, col, cell);
        }
    }
    Ok(grid)
}

fn check_gravity<const R: usize, const C: usize>(grid: &Grid<R, C>) -> Result<(), SnapshotError> {
    for col in 0..C {
        let mut gap = false;
        for row in 0..R {
            if grid.get(row, col).is_empty() {
                gap = true;
            } else if gap {
                return Err(SnapshotError::FloatingPiece { row, col });
            }
        }
    }
    Ok(())
}
