use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::cascade::{CascadeGame, CascadeStatus};
use super::classic::{ClassicGame, ClassicStatus};
use super::{MoveError, Player};

/// Anything a column-choosing player can be handed.
pub trait Playable {
    /// Columns that currently accept a piece; empty once the game is over.
    fn legal_columns(&self) -> Vec<usize>;
}

impl Playable for ClassicGame {
    fn legal_columns(&self) -> Vec<usize> {
        ClassicGame::legal_columns(self)
    }
}

impl Playable for CascadeGame {
    fn legal_columns(&self) -> Vec<usize> {
        CascadeGame::legal_columns(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Classic,
    Cascade,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Classic => f.write_str("classic"),
            GameKind::Cascade => f.write_str("cascade"),
        }
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(GameKind::Classic),
            "cascade" => Ok(GameKind::Cascade),
            other => Err(format!("unknown game '{other}' (expected 'classic' or 'cascade')")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

/// Either game, as driven by local matches and networked sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Classic(ClassicGame),
    Cascade(CascadeGame),
}

impl GameState {
    pub fn initial(kind: GameKind) -> Self {
        match kind {
            GameKind::Classic => GameState::Classic(ClassicGame::initial()),
            GameKind::Cascade => GameState::Cascade(CascadeGame::initial()),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            GameState::Classic(_) => GameKind::Classic,
            GameState::Cascade(_) => GameKind::Cascade,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            GameState::Classic(game) => game.is_terminal(),
            GameState::Cascade(game) => game.is_finished(),
        }
    }

    /// Get game outcome if game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self {
            GameState::Classic(game) => match game.status() {
                ClassicStatus::InProgress => None,
                ClassicStatus::Win(player) => Some(GameOutcome::Winner(player)),
                ClassicStatus::Draw => Some(GameOutcome::Draw),
            },
            GameState::Cascade(game) => match game.status() {
                CascadeStatus::Continue => None,
                CascadeStatus::Finished => Some(
                    game.winner()
                        .map_or(GameOutcome::Draw, GameOutcome::Winner),
                ),
            },
        }
    }

    /// Place a piece with the rules of the underlying game.
    pub fn place_piece(&mut self, column: usize, player: Player) -> Result<(), MoveError> {
        match self {
            GameState::Classic(game) => game.place_piece(column, player).map(|_| ()),
            GameState::Cascade(game) => game.place_piece(column, player).map(|_| ()),
        }
    }
}

impl Playable for GameState {
    fn legal_columns(&self) -> Vec<usize> {
        match self {
            GameState::Classic(game) => game.legal_columns(),
            GameState::Cascade(game) => game.legal_columns(),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::Classic(game) => write!(f, "{}", game.board()),
            GameState::Cascade(game) => {
                writeln!(
                    f,
                    "rows {}  matches {}  score {} - {}",
                    game.active_rows(),
                    game.match_count(),
                    game.score(Player::One),
                    game.score(Player::Two)
                )?;
                write!(f, "{}", game.board())
            }
        }
    }
}
