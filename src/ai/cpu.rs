use crate::game::{GameKind, GameState, Player};

use super::agent::Agent;
use super::lookahead::LookaheadAgent;
use super::minimax::MinimaxAgent;

/// Computer opponent for whichever game is being played.
pub enum Cpu {
    Minimax(MinimaxAgent),
    Lookahead(LookaheadAgent),
}

impl Cpu {
    /// Minimax for Classic, one-ply lookahead for Cascade.
    pub fn for_game(kind: GameKind, level: u8) -> Self {
        match kind {
            GameKind::Classic => Cpu::Minimax(MinimaxAgent::for_level(level)),
            GameKind::Cascade => Cpu::Lookahead(LookaheadAgent::new(level)),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Cpu::Minimax(_) => GameKind::Classic,
            Cpu::Lookahead(_) => GameKind::Cascade,
        }
    }

    /// Column for `player`, or `None` when the game is over or belongs to
    /// the other kind.
    pub fn choose(&mut self, state: &GameState, player: Player) -> Option<usize> {
        match (self, state) {
            (Cpu::Minimax(agent), GameState::Classic(game)) => agent.select_action(game, player),
            (Cpu::Lookahead(agent), GameState::Cascade(game)) => agent.select_action(game, player),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Cpu::Minimax(agent) => agent.name(),
            Cpu::Lookahead(agent) => agent.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Playable;

    #[test]
    fn test_cpu_matches_game_kind() {
        for kind in [GameKind::Classic, GameKind::Cascade] {
            let mut cpu = Cpu::for_game(kind, 3);
            assert_eq!(cpu.kind(), kind);
            let state = GameState::initial(kind);
            let col = cpu.choose(&state, Player::Two).unwrap();
            assert!(state.legal_columns().contains(&col));
        }
    }

    #[test]
    fn test_cpu_declines_other_kind() {
        let mut cpu = Cpu::for_game(GameKind::Classic, 2);
        let state = GameState::initial(GameKind::Cascade);
        assert_eq!(cpu.choose(&state, Player::Two), None);
        assert_eq!(cpu.name(), "Minimax");
    }
}
