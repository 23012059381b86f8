//! # Game API
//! This module contains the rules of turnless chess: the board state, move
//! generation gated by cooldowns, move execution and game outcomes.

pub mod action;
pub mod castling_rights;
pub mod colour;
pub mod fen;
pub(crate) mod history;
pub mod movegen;
pub mod outcome;
#[cfg(feature = "perft")]
pub mod perft;
pub mod piece;
pub mod play;
pub mod position;
pub mod selfplay;
pub mod square;
