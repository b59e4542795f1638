//! Game rules: the grid, run detection, the Classic and Cascade engines and
//! a state type covering both.

pub mod cascade;
pub mod classic;
mod grid;
mod player;
pub mod scanner;
mod state;

pub use cascade::{CascadeGame, CascadeGrid, CascadeStatus, MatchEffect, MoveReport};
pub use classic::{ClassicGame, ClassicGrid, ClassicStatus};
pub use grid::{Cell, Grid, MoveError};
pub use player::Player;
pub use scanner::{Coord, LineScanner, RUN_LENGTH};
pub use state::{GameKind, GameOutcome, GameState, Playable};
