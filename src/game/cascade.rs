//! Cascade rules: floating placement, match cascades and a growing board.
//!
//! Every run of four a move forms scores one point for the mover and bumps
//! the match counter. Odd matches turn the matched cells into markers; even
//! matches clear the matched cells together with every marker orthogonally
//! touching them. When the scores are level and the playable area is almost
//! full the ceiling rises by one row.

use std::collections::BTreeSet;

use log::warn;

use super::scanner::{Coord, LineScanner, RUN_LENGTH};
use super::{Cell, Grid, MoveError, Player};

pub const CASCADE_COLS: usize = 5;
pub const CASCADE_MAX_ROWS: usize = 6;
pub const CASCADE_START_ROWS: usize = 4;

/// Expansion triggers at or below this many empty active cells.
const EXPANSION_THRESHOLD: usize = 2;

pub type CascadeGrid = Grid<CASCADE_MAX_ROWS, CASCADE_COLS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStatus {
    Continue,
    Finished,
}

/// What a match did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEffect {
    /// Matched cells became markers.
    Marked,
    /// Matched cells were cleared along with `markers` adjacent markers.
    Cleared { markers: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub landed: Coord,
    pub matched: BTreeSet<Coord>,
    pub effect: Option<MatchEffect>,
    pub expanded: bool,
    /// The mover received the end-of-game bonus point.
    pub tie_break: bool,
    pub status: CascadeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeGame {
    board: CascadeGrid,
    active_rows: usize,
    match_count: u32,
    scores: [u32; 2],
    status: CascadeStatus,
}

impl CascadeGame {
    pub fn initial() -> Self {
        CascadeGame {
            board: CascadeGrid::new(),
            active_rows: CASCADE_START_ROWS,
            match_count: 0,
            scores: [0, 0],
            status: CascadeStatus::Continue,
        }
    }

    /// Assemble a game from already validated parts.
    pub fn from_parts(
        board: CascadeGrid,
        active_rows: usize,
        match_count: u32,
        scores: [u32; 2],
        status: CascadeStatus,
    ) -> Self {
        CascadeGame {
            board,
            active_rows,
            match_count,
            scores,
            status,
        }
    }

    pub fn board(&self) -> &CascadeGrid {
        &self.board
    }

    pub fn active_rows(&self) -> usize {
        self.active_rows
    }

    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.index()]
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    pub fn status(&self) -> CascadeStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == CascadeStatus::Finished
    }

    /// Empty cells below the ceiling.
    pub fn empty_cells(&self) -> usize {
        self.board.empty_below(self.active_rows)
    }

    /// Row a piece dropped into `column` would occupy: directly above the
    /// highest occupied active cell, or the floor. `None` if that row is at
    /// or above the ceiling.
    pub fn landing_row(&self, column: usize) -> Option<usize> {
        if column >= CASCADE_COLS {
            return None;
        }
        let row = (0..self.active_rows)
            .rev()
            .find(|&row| !self.board.get(row, column).is_empty())
            .map_or(0, |top| top + 1);
        (row < self.active_rows).then_some(row)
    }

    pub fn legal_columns(&self) -> Vec<usize> {
        if self.is_finished() {
            return Vec::new();
        }
        (0..CASCADE_COLS)
            .filter(|&col| self.landing_row(col).is_some())
            .collect()
    }

    /// Higher final score, `None` while running or on level scores.
    pub fn winner(&self) -> Option<Player> {
        if !self.is_finished() {
            return None;
        }
        let [one, two] = self.scores;
        match one.cmp(&two) {
            std::cmp::Ordering::Greater => Some(Player::One),
            std::cmp::Ordering::Less => Some(Player::Two),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Place `player`'s piece in `column` and resolve matches, expansion and
    /// termination in that order. A rejected move leaves the game untouched.
    pub fn place_piece(&mut self, column: usize, player: Player) -> Result<MoveReport, MoveError> {
        if self.is_finished() {
            return Err(MoveError::GameOver);
        }
        if column >= CASCADE_COLS {
            return Err(MoveError::InvalidColumn);
        }
        let row = self.landing_row(column).ok_or(MoveError::ColumnFull)?;
        self.board.set(row, column, player.to_cell());

        let matched = LineScanner::find_runs(&self.board, player, RUN_LENGTH, self.active_rows);
        let effect = if matched.is_empty() {
            None
        } else {
            Some(self.resolve_match(player, &matched))
        };

        let expanded = self.expand_if_due();
        let tie_break = self.check_termination(player);

        Ok(MoveReport {
            landed: (row, column),
            matched,
            effect,
            expanded,
            tie_break,
            status: self.status,
        })
    }

    fn resolve_match(&mut self, player: Player, matched: &BTreeSet<Coord>) -> MatchEffect {
        let score = &mut self.scores[player.index()];
        *score = score.saturating_add(1);
        self.match_count = self.match_count.saturating_add(1);

        if self.match_count % 2 == 1 {
            for &(row, col) in matched {
                self.board.set(row, col, Cell::Marker);
            }
            return MatchEffect::Marked;
        }

        for &(row, col) in matched {
            self.board.set(row, col, Cell::Empty);
        }
        let mut markers = 0;
        for &(row, col) in matched {
            for (r, c) in orthogonal_neighbours(row, col) {
                if self.board.get(r, c) == Cell::Marker {
                    self.board.set(r, c, Cell::Empty);
                    markers += 1;
                }
            }
        }
        MatchEffect::Cleared { markers }
    }

    /// No column accepts a piece even though gaps may remain below floating pieces.
    pub fn is_blocked(&self) -> bool {
        (0..CASCADE_COLS).all(|col| self.landing_row(col).is_none())
    }

    fn expand_if_due(&mut self) -> bool {
        let level = self.scores[0] == self.scores[1];
        let crowded = self.empty_cells() <= EXPANSION_THRESHOLD || self.is_blocked();
        if level && crowded && self.active_rows < CASCADE_MAX_ROWS {
            self.active_rows += 1;
            return true;
        }
        false
    }

    /// Returns true when the mover received the bonus point.
    fn check_termination(&mut self, mover: Player) -> bool {
        if self.empty_cells() > 0 && !self.is_blocked() {
            return false;
        }
        if self.scores[0] != self.scores[1] {
            let score = &mut self.scores[mover.index()];
            *score = score.saturating_add(1);
            self.status = CascadeStatus::Finished;
            return true;
        }
        if self.active_rows >= CASCADE_MAX_ROWS {
            self.status = CascadeStatus::Finished;
        } else {
            warn!(
                "cascade board closed with level scores below the maximum ceiling ({} rows)",
                self.active_rows
            );
        }
        false
    }
}

impl Default for CascadeGame {
    fn default() -> Self {
        Self::initial()
    }
}

fn orthogonal_neighbours(row: usize, col: usize) -> impl Iterator<Item = Coord> {
    let candidates = [
        row.checked_sub(1).map(|r| (r, col)),
        (row + 1 < CASCADE_MAX_ROWS).then_some((row + 1, col)),
        col.checked_sub(1).map(|c| (row, c)),
        (col + 1 < CASCADE_COLS).then_some((row, col + 1)),
    ];
    candidates.into_iter().flatten()
}
