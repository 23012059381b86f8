//! Enumerations of chessboard accessing constants, such as files, ranks and squares.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::parsing::PartialFromStr;

/// Files of a chessboard (A-H).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum File {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}
impl File {
    /// A file from a given index.
    ///
    /// Fails if the index is more than 7.
    #[inline]
    pub fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// A file from a given index.
    /// # Safety
    /// If the index is more than 7, results in undefined behavior.
    #[inline]
    pub unsafe fn from_index_unchecked(index: u8) -> Self {
        std::mem::transmute(index)
    }

    /// A file from its lowercase letter.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='h' => Self::from_index(c as u8 - b'a'),
            _ => None,
        }
    }

    /// Lowercase letter of this file.
    #[inline]
    pub const fn as_char(self) -> char {
        (b'a' + self as u8) as char
    }
}
impl std::fmt::Display for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Ranks of a chessboard (1-8).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Rank {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
}
impl Rank {
    /// A rank from a given index.
    ///
    /// Fails if the index is more than 7.
    #[inline]
    pub fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// A rank from a given index.
    /// # Safety
    /// If the index is more than 7, results in undefined behavior.
    #[inline]
    pub unsafe fn from_index_unchecked(index: u8) -> Self {
        std::mem::transmute(index)
    }

    /// A rank from its digit.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1'..='8' => Self::from_index(c as u8 - b'1'),
            _ => None,
        }
    }

    /// Digit of this rank.
    #[inline]
    pub const fn as_char(self) -> char {
        (b'1' + self as u8) as char
    }
}
impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A square of the 8x8 board, indexed rank-major from A1 to H8.
#[repr(u8)]
#[rustfmt::skip]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}
impl Square {
    /// Instantiates a new square based on file and rank.
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        unsafe { std::mem::transmute((rank as u8) << 3 | (file as u8)) }
    }

    /// Instantitates a new square from its index.
    ///
    /// Returns `None` if the index is more than 63.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// Instantitates a new square from its index.
    /// # Safety
    /// If the index is more than 63, causes undefined behavior.
    #[inline]
    pub const unsafe fn from_index_unchecked(index: u8) -> Self {
        std::mem::transmute(index)
    }

    /// Index of the square, from 0 (A1) to 63 (H8).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the rank of the square.
    #[inline]
    pub const fn rank(self) -> Rank {
        unsafe { std::mem::transmute((self as u8) >> 3) }
    }
    /// Returns the file of the square.
    #[inline]
    pub const fn file(self) -> File {
        unsafe { std::mem::transmute((self as u8) & 7) }
    }

    /// Translates this square by a number of files (towards H) and ranks
    /// (towards 8).
    ///
    /// Returns `None` if the translation would go out of the board.
    #[inline]
    pub const fn translate(self, files: i8, ranks: i8) -> Option<Self> {
        let file = self.file() as i8 + files;
        let rank = self.rank() as i8 + ranks;
        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            None
        } else {
            Some(unsafe { Self::from_index_unchecked((rank << 3 | file) as u8) })
        }
    }

    /// Checks if the square is a light square (H1 is light, A1 is dark).
    #[inline]
    pub const fn is_light(self) -> bool {
        (self.file() as u8 + self.rank() as u8) % 2 == 1
    }

    /// An iterator over all squares, ordered from A1 to H8.
    pub fn squares_iter() -> impl Iterator<Item = Self> {
        (0..64).map(|i| unsafe { Square::from_index_unchecked(i) })
    }

    /// An iterator over all square, ordered in big-endian rank/little-endian file
    /// (A8 to H1, like FEN placement).
    pub fn squares_fen_iter() -> impl Iterator<Item = Self> {
        (0..8).rev().flat_map(|rank| {
            (0..8).map(move |file| unsafe {
                let rank = Rank::from_index_unchecked(rank);
                let file = File::from_index_unchecked(file);
                Square::new(file, rank)
            })
        })
    }
}
impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
#[error("Invalid square")]
pub struct SquareParseError;

impl PartialFromStr for Square {
    type Err = SquareParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let mut chars = s.chars();
        let file = chars.next().and_then(File::from_char);
        let rank = chars.next().and_then(Rank::from_char);
        match (file, rank) {
            (Some(file), Some(rank)) => Ok((Square::new(file, rank), &s[2..])),
            _ => Err(SquareParseError),
        }
    }
}
impl std::str::FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::partial_from_str(s)? {
            (square, "") => Ok(square),
            _ => Err(SquareParseError),
        }
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid square {text:?}")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!("e4".parse(), Ok(Square::E4));
        assert_eq!("h8".parse(), Ok(Square::H8));
        assert_eq!("i1".parse::<Square>(), Err(SquareParseError));
        assert_eq!("a9".parse::<Square>(), Err(SquareParseError));
        assert_eq!("e4e5".parse::<Square>(), Err(SquareParseError));
        assert_eq!(Square::partial_from_str("d4rest"), Ok((Square::D4, "rest")));
        for square in Square::squares_iter() {
            assert_eq!(square.to_string().parse(), Ok(square));
        }
    }

    #[test]
    fn translation_stays_on_board() {
        assert_eq!(Square::E4.translate(1, 2), Some(Square::F6));
        assert_eq!(Square::A1.translate(-1, 0), None);
        assert_eq!(Square::H8.translate(0, 1), None);
        assert_eq!(Square::H4.translate(1, 0), None);
        assert_eq!(Square::B1.translate(-2, 1), None);
        assert_eq!(Square::G8.translate(-1, -2), Some(Square::F6));
    }

    #[test]
    fn fen_order_starts_top_left() {
        let squares: Vec<_> = Square::squares_fen_iter().collect();
        assert_eq!(squares.len(), 64);
        assert_eq!(squares[0], Square::A8);
        assert_eq!(squares[7], Square::H8);
        assert_eq!(squares[8], Square::A7);
        assert_eq!(squares[63], Square::H1);
    }

    #[test]
    fn square_colours() {
        assert!(!Square::A1.is_light());
        assert!(Square::H1.is_light());
        assert!(Square::D1.is_light());
        assert!(!Square::D8.is_light());
    }

    #[test]
    fn wire_format() {
        assert_eq!(serde_json::to_string(&Square::E2).unwrap(), "\"e2\"");
        assert_eq!(serde_json::from_str::<Square>("\"g7\"").unwrap(), Square::G7);
        assert!(serde_json::from_str::<Square>("\"z7\"").is_err());
    }
}
