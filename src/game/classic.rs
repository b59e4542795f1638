use super::scanner::{LineScanner, RUN_LENGTH};
use super::{Cell, Grid, MoveError, Player};

pub const CLASSIC_ROWS: usize = 6;
pub const CLASSIC_COLS: usize = 7;

pub type ClassicGrid = Grid<CLASSIC_ROWS, CLASSIC_COLS>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassicStatus {
    InProgress,
    Win(Player),
    Draw,
}

impl ClassicStatus {
    pub fn is_terminal(self) -> bool {
        self != ClassicStatus::InProgress
    }
}

/// Classic four-in-a-row: gravity drop, first run of four wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicGame {
    board: ClassicGrid,
    status: ClassicStatus,
}

impl ClassicGame {
    /// Create initial game state
    pub fn initial() -> Self {
        ClassicGame {
            board: ClassicGrid::new(),
            status: ClassicStatus::InProgress,
        }
    }

    /// Rebuild a game from a board, deriving its status.
    pub fn from_board(board: ClassicGrid) -> Self {
        let status = if LineScanner::has_run(&board, Player::One, RUN_LENGTH) {
            ClassicStatus::Win(Player::One)
        } else if LineScanner::has_run(&board, Player::Two, RUN_LENGTH) {
            ClassicStatus::Win(Player::Two)
        } else if board.is_full() {
            ClassicStatus::Draw
        } else {
            ClassicStatus::InProgress
        };
        ClassicGame { board, status }
    }

    /// Get reference to board
    pub fn board(&self) -> &ClassicGrid {
        &self.board
    }

    pub fn status(&self) -> ClassicStatus {
        self.status
    }

    /// Check if game is over
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Player whose turn it is under alternating play, Player One first.
    pub fn to_move(&self) -> Player {
        if self.board.count(Cell::Owned(Player::One)) > self.board.count(Cell::Owned(Player::Two)) {
            Player::Two
        } else {
            Player::One
        }
    }

    /// Get list of legal columns (not full)
    pub fn legal_columns(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        (0..CLASSIC_COLS)
            .filter(|&col| !self.board.is_column_full(col))
            .collect()
    }

    /// Drop `player`'s piece into `column`. A rejected move leaves the game untouched.
    pub fn place_piece(&mut self, column: usize, player: Player) -> Result<ClassicStatus, MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }

        self.board.drop_piece(column, player.to_cell())?;

        if LineScanner::has_run(&self.board, player, RUN_LENGTH) {
            self.status = ClassicStatus::Win(player);
        } else if self.board.is_full() {
            self.status = ClassicStatus::Draw;
        }

        Ok(self.status)
    }

    /// Apply a move for the player to move and return the new state (immutable)
    pub fn apply_move(&self, column: usize) -> Result<ClassicGame, MoveError> {
        let mut next = *self;
        next.place_piece(column, self.to_move())?;
        Ok(next)
    }
}

impl Default for ClassicGame {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;
    use rand::SeedableRng;

    #[test]
    fn test_initial_state() {
        let game = ClassicGame::initial();
        assert_eq!(game.to_move(), Player::One);
        assert!(!game.is_terminal());
        assert_eq!(game.legal_columns().len(), 7);
    }

    #[test]
    fn test_apply_move() {
        let game = ClassicGame::initial();
        let next = game.apply_move(3).unwrap();

        assert_eq!(next.to_move(), Player::Two);
        assert_eq!(next.board().get(0, 3), Cell::Owned(Player::One));
        // Original untouched
        assert_eq!(game.board().occupied(), 0);
    }

    #[test]
    fn four_drops_in_one_column_win() {
        let mut game = ClassicGame::initial();
        for _ in 0..3 {
            assert_eq!(game.place_piece(0, Player::One), Ok(ClassicStatus::InProgress));
        }
        assert_eq!(game.place_piece(0, Player::One), Ok(ClassicStatus::Win(Player::One)));
        for row in 0..4 {
            assert_eq!(game.board().get(row, 0), Cell::Owned(Player::One));
        }
        assert_eq!(game.board().get(4, 0), Cell::Empty);
    }

    #[test]
    fn test_win_detection() {
        let mut game = ClassicGame::initial();

        // Player One builds a horizontal line on the floor
        for col in 0..4 {
            game = game.apply_move(col).unwrap();
            if col < 3 {
                game = game.apply_move(col).unwrap();
            }
        }

        assert!(game.is_terminal());
        assert_eq!(game.status(), ClassicStatus::Win(Player::One));
        assert!(game.legal_columns().is_empty());
    }

    #[test]
    fn rejected_moves_do_not_mutate() {
        let mut game = ClassicGame::initial();
        for player in [Player::One, Player::One, Player::Two, Player::Two, Player::One, Player::One] {
            game.place_piece(5, player).unwrap();
        }
        let before = game;
        assert_eq!(game.place_piece(5, Player::One), Err(MoveError::ColumnFull));
        assert_eq!(game.place_piece(9, Player::One), Err(MoveError::InvalidColumn));
        assert_eq!(game, before);
    }

    #[test]
    fn no_moves_after_game_over() {
        let mut game = ClassicGame::initial();
        for _ in 0..4 {
            game.place_piece(2, Player::Two).unwrap();
        }
        let before = game;
        assert_eq!(game.place_piece(3, Player::One), Err(MoveError::GameOver));
        assert_eq!(game, before);
    }

    #[test]
    fn test_draw() {
        // Alternating XXOOXXO / OOXXOOX rows leave no line of four anywhere.
        let even = "XXOOXXO";
        let odd = "OOXXOOX";
        let mut game = ClassicGame::initial();
        for row in 0..CLASSIC_ROWS {
            let pattern = if row % 2 == 0 { even } else { odd };
            for (col, symbol) in pattern.chars().enumerate() {
                let player = if symbol == 'X' { Player::One } else { Player::Two };
                game.place_piece(col, player).unwrap();
            }
        }
        assert_eq!(game.status(), ClassicStatus::Draw);
        assert!(game.board().is_full());
    }

    #[test]
    fn random_play_counts_pieces() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut game = ClassicGame::initial();
            while !game.is_terminal() {
                let before = game.board().occupied();
                let col = *game.legal_columns().choose(&mut rng).unwrap();
                game = game.apply_move(col).unwrap();
                assert_eq!(game.board().occupied(), before + 1);

                let full = (0..CLASSIC_COLS).find(|&c| game.board().is_column_full(c));
                if let Some(full) = full {
                    let occupied = game.board().occupied();
                    assert!(game.apply_move(full).is_err());
                    assert_eq!(game.board().occupied(), occupied);
                }
            }
            assert_eq!(ClassicGame::from_board(*game.board()).status(), game.status());
        }
    }
}
