use std::fmt;

use super::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Owned(Player),
    /// Only produced by the Cascade rules.
    Marker,
}

impl Cell {
    /// Wire value used in persisted game state.
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Owned(Player::One) => 1,
            Cell::Owned(Player::Two) => 2,
            Cell::Marker => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Owned(Player::One)),
            2 => Some(Cell::Owned(Player::Two)),
            3 => Some(Cell::Marker),
            _ => None,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Owned(Player::One) => 'X',
            Cell::Owned(Player::Two) => 'O',
            Cell::Marker => '#',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column is out of range")]
    InvalidColumn,
    #[error("column is full")]
    ColumnFull,
    #[error("game is over")]
    GameOver,
}

/// Fixed-size placement surface. Row 0 is the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid<const ROWS: usize, const COLS: usize> {
    cells: [[Cell; COLS]; ROWS],
}

impl<const ROWS: usize, const COLS: usize> Grid<ROWS, COLS> {
    /// Create a new empty grid
    pub fn new() -> Self {
        Grid {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Get the cell at a specific position
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row][col] = cell;
    }

    /// Check if a column has no room left for a gravity drop
    pub fn is_column_full(&self, col: usize) -> bool {
        if col >= COLS {
            return true;
        }
        !self.cells[ROWS - 1][col].is_empty()
    }

    /// Lowest empty row in a column, counted from the floor.
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        (0..ROWS).find(|&row| self.cells[row][col].is_empty())
    }

    /// Drop a piece in a column, returns the row where it landed
    pub fn drop_piece(&mut self, col: usize, cell: Cell) -> Result<usize, MoveError> {
        if col >= COLS {
            return Err(MoveError::InvalidColumn);
        }
        let row = self.landing_row(col).ok_or(MoveError::ColumnFull)?;
        self.cells[row][col] = cell;
        Ok(row)
    }

    /// Remove the topmost piece of a column. Used to undo a hypothetical drop.
    pub fn lift_piece(&mut self, col: usize) -> Option<Cell> {
        let row = (0..ROWS).rev().find(|&row| !self.cells[row][col].is_empty())?;
        Some(std::mem::replace(&mut self.cells[row][col], Cell::Empty))
    }

    /// Check if the grid is completely full
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|c| !c.is_empty())
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().flatten().filter(|&&c| c == cell).count()
    }

    /// Number of non-empty cells.
    pub fn occupied(&self) -> usize {
        ROWS * COLS - self.count(Cell::Empty)
    }

    /// Empty cells in the rows below `active_rows`.
    pub fn empty_below(&self, active_rows: usize) -> usize {
        self.cells[..active_rows.min(ROWS)]
            .iter()
            .flatten()
            .filter(|c| c.is_empty())
            .count()
    }
}

impl<const ROWS: usize, const COLS: usize> Default for Grid<ROWS, COLS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROWS: usize, const COLS: usize> fmt::Display for Grid<ROWS, COLS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..ROWS).rev() {
            let line: String = self.cells[row].iter().map(|c| c.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        let footer: String = (0..COLS)
            .map(|c| char::from_digit(c as u32 % 10, 10).unwrap_or('?'))
            .collect();
        write!(f, "{footer}")
    }
}
