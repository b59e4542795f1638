use crate::game::Player;

/// Universal interface for computer opponents of a game `G`.
pub trait Agent<G> {
    /// Select a column for `player`, or `None` when no column is legal.
    fn select_action(&mut self, game: &G, player: Player) -> Option<usize>;

    /// Return the agent's display name.
    fn name(&self) -> &str;
}
