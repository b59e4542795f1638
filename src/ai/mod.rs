mod agent;
mod cpu;
pub mod lookahead;
pub mod minimax;
mod random;

pub use agent::Agent;
pub use cpu::Cpu;
pub use lookahead::LookaheadAgent;
pub use minimax::{Heuristic, MinimaxAgent, WindowHeuristic, WIN_SCORE};
pub use random::RandomAgent;
