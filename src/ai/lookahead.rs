use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::cascade::CASCADE_COLS;
use crate::game::{CascadeGame, Player};

use super::agent::Agent;

const GAIN_WEIGHT: i32 = 10;
const BLOCK_BONUS: i32 = 5;
const CENTER_BONUS: i32 = 1;

/// One-ply lookahead for Cascade.
///
/// Level 1 is random. Level 2 rewards columns that score, level 3 also
/// rewards taking a column the opponent would score with, and level 4 adds
/// a small pull toward the three middle columns.
pub struct LookaheadAgent {
    level: u8,
    rng: StdRng,
}

impl LookaheadAgent {
    pub fn new(level: u8) -> Self {
        LookaheadAgent {
            level: level.max(1),
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Score `column` would earn `player`, or `None` when it is not playable.
    fn gain(game: &CascadeGame, column: usize, player: Player) -> Option<u32> {
        let mut trial = *game;
        trial.place_piece(column, player).ok()?;
        Some(trial.score(player).saturating_sub(game.score(player)))
    }

    /// Total used to rank `column`; higher is better.
    pub fn evaluate(&self, game: &CascadeGame, column: usize, player: Player) -> i32 {
        let mut total = 0;
        if self.level >= 2 {
            total += Self::gain(game, column, player).unwrap_or(0) as i32 * GAIN_WEIGHT;
        }
        if self.level >= 3 && Self::gain(game, column, player.other()).unwrap_or(0) > 0 {
            total += BLOCK_BONUS;
        }
        if self.level >= 4 && is_central(column) {
            total += CENTER_BONUS;
        }
        total
    }
}

fn is_central(column: usize) -> bool {
    let center = CASCADE_COLS / 2;
    column + 1 >= center && column <= center + 1
}

impl Agent<CascadeGame> for LookaheadAgent {
    fn select_action(&mut self, game: &CascadeGame, player: Player) -> Option<usize> {
        let mut legal = game.legal_columns();
        if legal.is_empty() {
            return None;
        }
        let start = self.rng.random_range(0..legal.len());
        legal.rotate_left(start);
        if self.level <= 1 {
            return Some(legal[0]);
        }

        let mut best = legal[0];
        let mut best_total = self.evaluate(game, best, player);
        for &column in &legal[1..] {
            let total = self.evaluate(game, column, player);
            if total > best_total {
                best = column;
                best_total = total;
            }
        }
        debug!("lookahead level {} picked {best} (total {best_total})", self.level);
        Some(best)
    }

    fn name(&self) -> &str {
        "Lookahead"
    }
}
