//! Entente rules core.
//!
//! The adjudication engine for a Diplomacy-style simultaneous-move board
//! game: variant topology loading, order parsing, convoy routing, phase
//! judges, and the game aggregate that drives a position through the
//! phase sequence. Transport, rendering, and AI clients sit on top of
//! [`game::Game`] and the serializable snapshots it exports.

pub mod board;
pub mod convoy;
pub mod game;
pub mod judge;
pub mod parse;
