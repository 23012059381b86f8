//! Colours for each players and their pieces.

use serde::{Deserialize, Serialize};

/// Number of different colours (2).
pub const NUM_COLOURS: usize = 2;

/// Colour enumeration.
///
/// There is no side to move in this variant: a colour only tells who owns a
/// piece.
#[repr(u8)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
pub enum Colour {
    #[serde(rename = "w")]
    White = 0,
    #[serde(rename = "b")]
    Black = 1,
}
impl Colour {
    /// Inverts the colour in place.
    #[inline]
    pub fn invert(&mut self) {
        *self = self.inverse()
    }

    /// Returns the inverse of this colour.
    #[inline]
    pub const fn inverse(&self) -> Self {
        if self.is_black() {
            Colour::White
        } else {
            Colour::Black
        }
    }

    /// Checks if the colour variant is white.
    #[inline]
    pub const fn is_white(&self) -> bool {
        matches!(self, Colour::White)
    }

    /// Checks if the colour variant is black.
    #[inline]
    pub const fn is_black(&self) -> bool {
        matches!(self, Colour::Black)
    }

    /// Letter used to tag moves of this colour in a move log (`W` or `B`).
    #[inline]
    pub const fn log_letter(&self) -> char {
        if self.is_black() {
            'B'
        } else {
            'W'
        }
    }

    /// Colour tagged by a move log letter.
    pub const fn from_log_letter(letter: char) -> Option<Self> {
        match letter {
            'W' => Some(Colour::White),
            'B' => Some(Colour::Black),
            _ => None,
        }
    }

    /// Iterator over both colours, white first.
    pub fn iter() -> impl Iterator<Item = Self> {
        [Colour::White, Colour::Black].into_iter()
    }
}
impl std::fmt::Display for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if self.is_black() { "black" } else { "white" })
    }
}
