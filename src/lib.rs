//! # kfchess
//! A turnless chess engine: any piece may move at any time once its cooldown
//! has elapsed, and games end when a king is captured.
//!
//! It is usable as both a library to embed into game servers and clients, and
//! a standalone binary hosting games over standard I/O.

pub mod game;
pub mod parsing;
pub mod pgn;
pub mod protocols;

#[cfg(test)]
mod tests;
