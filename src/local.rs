//! Matches played on one machine: two people taking turns at the same
//! terminal, or one person against the computer.

use log::{debug, info};

use crate::ai::Cpu;
use crate::game::{GameKind, GameOutcome, GameState, MoveError, Player};

pub struct LocalMatch {
    state: GameState,
    turn: Player,
    /// Plays Player Two when present.
    cpu: Option<Cpu>,
}

impl LocalMatch {
    pub fn two_player(kind: GameKind) -> Self {
        LocalMatch {
            state: GameState::initial(kind),
            turn: Player::One,
            cpu: None,
        }
    }

    pub fn versus_cpu(kind: GameKind, level: u8) -> Self {
        Self::with_cpu(Cpu::for_game(kind, level))
    }

    pub fn with_cpu(cpu: Cpu) -> Self {
        let kind = cpu.kind();
        LocalMatch {
            cpu: Some(cpu),
            ..Self::two_player(kind)
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn kind(&self) -> GameKind {
        self.state.kind()
    }

    pub fn turn(&self) -> Player {
        self.turn
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.state.outcome()
    }

    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_cpu_turn(&self) -> bool {
        self.cpu.is_some() && self.turn == Player::Two && !self.is_over()
    }

    /// Place a piece for the player to move. The turn passes only when the
    /// move is accepted.
    pub fn play(&mut self, column: usize) -> Result<(), MoveError> {
        self.state.place_piece(column, self.turn)?;
        debug!("{} played column {column}", self.turn.name());
        self.turn = self.turn.other();
        if let Some(outcome) = self.outcome() {
            info!("local {} game over: {outcome:?}", self.kind());
        }
        Ok(())
    }

    /// Let the computer move if it is its turn. Returns the chosen column.
    pub fn cpu_turn(&mut self) -> Result<Option<usize>, MoveError> {
        if !self.is_cpu_turn() {
            return Ok(None);
        }
        let choice = match self.cpu.as_mut() {
            Some(cpu) => cpu.choose(&self.state, self.turn),
            None => None,
        };
        match choice {
            Some(column) => {
                self.play(column)?;
                Ok(Some(column))
            }
            None => Ok(None),
        }
    }

    /// Start over with the same game and opponent.
    pub fn reset(&mut self) {
        self.state = GameState::initial(self.kind());
        self.turn = Player::One;
    }
}
