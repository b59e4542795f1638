use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::game::classic::{CLASSIC_COLS, CLASSIC_ROWS};
use crate::game::scanner::windows;
use crate::game::{Cell, ClassicGame, ClassicGrid, LineScanner, Player, RUN_LENGTH};

use super::agent::Agent;

/// Score of a position the searching player has won.
pub const WIN_SCORE: i64 = 10_000_000;

/// Trait for evaluating a board position from a player's perspective.
pub trait Heuristic: Send {
    fn evaluate(&self, board: &ClassicGrid, player: Player) -> i64;
}

/// Default heuristic that scans all 4-cell windows and scores threats.
pub struct WindowHeuristic;

impl WindowHeuristic {
    fn score_window(own: usize, opp: usize, empty: usize) -> i64 {
        let mut score = if own == 4 {
            100
        } else if own == 3 && empty == 1 {
            5
        } else if own == 2 && empty == 2 {
            2
        } else {
            0
        };
        if opp == 3 && empty == 1 {
            score -= 4;
        }
        score
    }
}

impl Heuristic for WindowHeuristic {
    fn evaluate(&self, board: &ClassicGrid, player: Player) -> i64 {
        let own_cell = player.to_cell();
        let opp_cell = player.other().to_cell();

        // Center column bonus
        let center = CLASSIC_COLS / 2;
        let mut score = (0..CLASSIC_ROWS)
            .filter(|&row| board.get(row, center) == own_cell)
            .count() as i64
            * 3;

        for window in windows(CLASSIC_ROWS, CLASSIC_COLS, RUN_LENGTH) {
            let mut own = 0;
            let mut opp = 0;
            let mut empty = 0;
            for (row, col) in window.coords() {
                match board.get(row, col) {
                    c if c == own_cell => own += 1,
                    c if c == opp_cell => opp += 1,
                    Cell::Empty => empty += 1,
                    _ => {}
                }
            }
            score += Self::score_window(own, opp, empty);
        }

        score
    }
}

/// Minimax agent with alpha-beta pruning. Depth 0 plays a random legal column.
pub struct MinimaxAgent {
    depth: usize,
    heuristic: Box<dyn Heuristic>,
    rng: StdRng,
}

impl MinimaxAgent {
    pub fn new(depth: usize) -> Self {
        MinimaxAgent {
            depth,
            heuristic: Box::new(WindowHeuristic),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Difficulty level 1 plays randomly; level `n` searches `n + 1` plies.
    pub fn for_level(level: u8) -> Self {
        let depth = if level <= 1 { 0 } else { level as usize + 1 };
        Self::new(depth)
    }

    pub fn with_heuristic(depth: usize, heuristic: Box<dyn Heuristic>) -> Self {
        MinimaxAgent {
            heuristic,
            ..Self::new(depth)
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Best column for `ai` and its minimax score.
    pub fn search(&mut self, game: &ClassicGame, ai: Player) -> (Option<usize>, i64) {
        let mut board = *game.board();
        self.minimax(&mut board, self.depth, i64::MIN, i64::MAX, true, ai)
    }

    fn minimax(
        &mut self,
        board: &mut ClassicGrid,
        depth: usize,
        mut alpha: i64,
        mut beta: i64,
        maximizing: bool,
        ai: Player,
    ) -> (Option<usize>, i64) {
        let mut legal: Vec<usize> = (0..CLASSIC_COLS)
            .filter(|&col| !board.is_column_full(col))
            .collect();
        let ai_won = LineScanner::has_run(board, ai, RUN_LENGTH);
        let opponent_won = LineScanner::has_run(board, ai.other(), RUN_LENGTH);

        if ai_won || opponent_won || legal.is_empty() {
            let score = if ai_won {
                WIN_SCORE
            } else if opponent_won {
                -WIN_SCORE
            } else {
                0
            };
            return (None, score);
        }
        if depth == 0 {
            return (None, self.heuristic.evaluate(board, ai));
        }

        // Random legal column goes first so ties keep it
        let start = self.rng.random_range(0..legal.len());
        legal.rotate_left(start);
        let mut column = legal[0];
        let mover = if maximizing { ai } else { ai.other() };
        let mut value = if maximizing { i64::MIN } else { i64::MAX };

        for &col in &legal {
            if board.drop_piece(col, mover.to_cell()).is_err() {
                continue;
            }
            let (_, score) = self.minimax(board, depth - 1, alpha, beta, !maximizing, ai);
            board.lift_piece(col);

            if maximizing {
                if score > value {
                    value = score;
                    column = col;
                }
                alpha = alpha.max(value);
            } else {
                if score < value {
                    value = score;
                    column = col;
                }
                beta = beta.min(value);
            }
            if alpha >= beta {
                break;
            }
        }

        (Some(column), value)
    }
}

impl Agent<ClassicGame> for MinimaxAgent {
    fn select_action(&mut self, game: &ClassicGame, player: Player) -> Option<usize> {
        if game.is_terminal() {
            return None;
        }
        if self.depth == 0 {
            return game.legal_columns().choose(&mut self.rng).copied();
        }
        let (column, score) = self.search(game, player);
        debug!("minimax depth {} picked {:?} (score {score})", self.depth, column);
        column
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}
