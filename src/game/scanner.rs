//! Direction-agnostic run detection over a [`Grid`].

use std::collections::BTreeSet;

use super::{Cell, Grid, Player};

/// Length of a winning / matching run.
pub const RUN_LENGTH: usize = 4;

/// `(row, col)` with row 0 at the floor.
pub type Coord = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
    /// Bottom-left to top-right, /
    DiagonalUp,
    /// Top-left to bottom-right, \
    DiagonalDown,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::DiagonalUp,
        Direction::DiagonalDown,
    ];

    fn step(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::DiagonalUp => (1, 1),
            Direction::DiagonalDown => (-1, 1),
        }
    }
}

/// A straight line of `length` cells starting at `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Window {
    pub fn coords(self) -> impl Iterator<Item = Coord> {
        let (dr, dc) = self.direction.step();
        (0..self.length as isize).map(move |i| {
            (
                (self.row as isize + dr * i) as usize,
                (self.col as isize + dc * i) as usize,
            )
        })
    }
}

/// Every window of `length` cells, in all four orientations, that fits in
/// a `rows` × `cols` area.
pub fn windows(rows: usize, cols: usize, length: usize) -> impl Iterator<Item = Window> {
    let span = length.max(1) as isize - 1;
    Direction::ALL.into_iter().flat_map(move |direction| {
        let (dr, dc) = direction.step();
        (0..rows)
            .flat_map(move |row| (0..cols).map(move |col| (row, col)))
            .filter(move |&(row, col)| {
                let end_row = row as isize + dr * span;
                let end_col = col as isize + dc * span;
                (0..rows as isize).contains(&end_row) && (0..cols as isize).contains(&end_col)
            })
            .map(move |(row, col)| Window {
                row,
                col,
                direction,
                length,
            })
    })
}

pub struct LineScanner;

impl LineScanner {
    /// True when `player` owns `length` contiguous cells in any orientation.
    pub fn has_run<const R: usize, const C: usize>(
        grid: &Grid<R, C>,
        player: Player,
        length: usize,
    ) -> bool {
        if length == 0 {
            return false;
        }
        let owned = Cell::Owned(player);
        windows(R, C, length).any(|w| w.coords().all(|(r, c)| grid.get(r, c) == owned))
    }

    /// Union of the coordinates of every run owned by `player` below the
    /// `active_rows` ceiling.
    pub fn find_runs<const R: usize, const C: usize>(
        grid: &Grid<R, C>,
        player: Player,
        length: usize,
        active_rows: usize,
    ) -> BTreeSet<Coord> {
        if length == 0 {
            return BTreeSet::new();
        }
        let owned = Cell::Owned(player);
        windows(active_rows.min(R), C, length)
            .filter(|w| w.coords().all(|(r, c)| grid.get(r, c) == owned))
            .flat_map(Window::coords)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: Cell = Cell::Owned(Player::One);
    const P2: Cell = Cell::Owned(Player::Two);

    fn row_grid<const C: usize>(row: [Cell; C]) -> Grid<1, C> {
        let mut grid = Grid::new();
        for (col, cell) in row.into_iter().enumerate() {
            grid.set(0, col, cell);
        }
        grid
    }

    #[test]
    fn window_count_on_classic_grid() {
        // 24 horizontal + 21 vertical + 12 per diagonal
        assert_eq!(windows(6, 7, 4).count(), 69);
    }

    #[test]
    fn finds_horizontal_run() {
        let grid = row_grid([P1, P1, P1, P1, Cell::Empty, Cell::Empty, Cell::Empty]);
        assert!(LineScanner::has_run(&grid, Player::One, RUN_LENGTH));
        assert!(!LineScanner::has_run(&grid, Player::Two, RUN_LENGTH));
    }

    #[test]
    fn broken_row_has_no_run() {
        let grid = row_grid([P1, P1, P1, P2]);
        assert!(!LineScanner::has_run(&grid, Player::One, RUN_LENGTH));
    }

    #[test]
    fn marker_breaks_a_run() {
        let grid = row_grid([P1, P1, Cell::Marker, P1, P1]);
        assert!(!LineScanner::has_run(&grid, Player::One, RUN_LENGTH));
    }

    #[test]
    fn finds_both_diagonals() {
        let mut up = Grid::<6, 7>::new();
        let mut down = Grid::<6, 7>::new();
        for i in 0..4 {
            up.set(i, i + 1, P2);
            down.set(3 - i, i + 2, P2);
        }
        assert!(LineScanner::has_run(&up, Player::Two, RUN_LENGTH));
        assert!(LineScanner::has_run(&down, Player::Two, RUN_LENGTH));
    }

    #[test]
    fn overlapping_runs_are_unioned() {
        // Horizontal run of five plus a vertical run sharing (0, 2)
        let mut grid = Grid::<6, 5>::new();
        for col in 0..5 {
            grid.set(0, col, P1);
        }
        for row in 1..4 {
            grid.set(row, 2, P1);
        }
        let matched = LineScanner::find_runs(&grid, Player::One, RUN_LENGTH, 4);
        assert_eq!(matched.len(), 8);
        assert!(matched.contains(&(0, 0)));
        assert!(matched.contains(&(0, 4)));
        assert!(matched.contains(&(3, 2)));
    }

    #[test]
    fn zero_length_matches_nothing() {
        let grid = row_grid([P1, P1, P1, P1]);
        assert!(!LineScanner::has_run(&grid, Player::One, 0));
        assert!(!LineScanner::has_run(&Grid::<6, 7>::new(), Player::Two, 0));
        assert!(LineScanner::find_runs(&grid, Player::One, 0, 1).is_empty());
    }

    #[test]
    fn find_runs_respects_ceiling() {
        let mut grid = Grid::<6, 5>::new();
        for row in 1..5 {
            grid.set(row, 0, P1);
        }
        assert!(LineScanner::find_runs(&grid, Player::One, RUN_LENGTH, 4).is_empty());
        assert_eq!(LineScanner::find_runs(&grid, Player::One, RUN_LENGTH, 5).len(), 4);
    }
}
