//! # Connect Cascade
//!
//! Four-in-a-row in two flavours: the Classic 7×6 gravity game and Cascade,
//! a 5-column variant where pieces float, completed lines turn into markers
//! or vanish, and the ceiling rises when the score is level. Includes
//! computer opponents for both and a turn-synchronized protocol for two
//! processes sharing a session store.
//!
//! ## Modules
//!
//! - [`game`] — Grid, line scanning, Classic and Cascade rules
//! - [`ai`] — Minimax for Classic, one-ply lookahead for Cascade
//! - [`local`] — Hot-seat and versus-CPU matches
//! - [`session`] — Rooms, accounts, stores and turn polling
//! - [`config`] — TOML configuration loading and validation
//! - [`logging`] — flexi_logger setup
//! - [`error`] — Structured error types

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod local;
pub mod logging;
pub mod session;
