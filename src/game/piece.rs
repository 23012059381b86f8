//! Piece types encoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::colour::Colour;

/// Total number of different piece kinds (6).
pub const NUM_PIECES: usize = 6;

/// Milliseconds on the game clock.
pub type Timestamp = u64;

const PIECE_SYMBOLS: [char; 12] = ['P', 'N', 'B', 'R', 'Q', 'K', 'p', 'n', 'b', 'r', 'q', 'k'];

/// The kind of a piece, one of Pawn, Knight, Bishop, Rook, Queen or King.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "p")]
    Pawn = 0,
    #[serde(rename = "n")]
    Knight = 1,
    #[serde(rename = "b")]
    Bishop = 2,
    #[serde(rename = "r")]
    Rook = 3,
    #[serde(rename = "q")]
    Queen = 4,
    #[serde(rename = "k")]
    King = 5,
}
impl PieceKind {
    /// All piece kinds.
    pub const PIECE_KINDS: [Self; NUM_PIECES] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Pieces a pawn can promote to, in generation order.
    pub const PROMOTIONS: [Self; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Iterator over all piece kinds.
    pub fn iter() -> impl Iterator<Item = Self> {
        Self::PIECE_KINDS.into_iter()
    }

    /// Checks if this piece kind is a minor piece (bishops and knights).
    #[inline]
    pub const fn is_minor(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Knight)
    }

    /// Lowercase letter of this piece kind.
    #[inline]
    pub const fn symbol(self) -> char {
        PIECE_SYMBOLS[self as usize + NUM_PIECES]
    }

    /// Uppercase letter used in algebraic notation.
    #[inline]
    pub const fn san_symbol(self) -> char {
        PIECE_SYMBOLS[self as usize]
    }

    /// Piece kind from its letter, in either case.
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        Some(match symbol.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        })
    }
}
impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Error)]
#[error("Invalid piece symbol")]
pub struct PieceParseError;

/// A piece on the board, along with its cooldown state.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub colour: Colour,
    /// Time of the last completed move of this piece, `None` if it never moved.
    pub last_move_time: Option<Timestamp>,
}
impl Piece {
    /// A piece that never moved.
    pub const fn new(kind: PieceKind, colour: Colour) -> Self {
        Self {
            kind,
            colour,
            last_move_time: None,
        }
    }

    /// Same piece, last moved at the given time.
    pub const fn moved_at(mut self, time: Timestamp) -> Self {
        self.last_move_time = Some(time);
        self
    }

    /// FEN letter of this piece: uppercase for white, lowercase for black.
    #[inline]
    pub const fn symbol(&self) -> char {
        PIECE_SYMBOLS[self.colour as usize * NUM_PIECES + self.kind as usize]
    }

    /// Parses a FEN letter.
    pub fn from_symbol(symbol: char) -> Result<Self, PieceParseError> {
        let kind = PieceKind::from_symbol(symbol).ok_or(PieceParseError)?;
        let colour = if symbol.is_ascii_uppercase() {
            Colour::White
        } else {
            Colour::Black
        };
        Ok(Self::new(kind, colour))
    }

    /// Checks if the piece may move at `now` given a cooldown duration.
    ///
    /// The bound is inclusive: a piece that moved at `t` may move again at
    /// `t + cooldown`.
    #[inline]
    pub fn is_ready(&self, cooldown: Timestamp, now: Timestamp) -> bool {
        match self.last_move_time {
            Some(last) if cooldown > 0 => now.saturating_sub(last) >= cooldown,
            _ => true,
        }
    }

    /// Time left before this piece may move again.
    pub fn remaining_cooldown(&self, cooldown: Timestamp, now: Timestamp) -> Timestamp {
        match self.last_move_time {
            Some(last) => cooldown.saturating_sub(now.saturating_sub(last)),
            None => 0,
        }
    }
}
impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
