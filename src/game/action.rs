//! Moves as produced by the generator, and move requests as sent over the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parsing::PartialFromStr;

use super::{
    colour::Colour,
    piece::{PieceKind, Timestamp},
    square::Square,
};

/// Algebraic notation of a move. The longest form, `Qa1xb2`, fits easily.
pub type San = heapless::String<8>;

/// Set of properties of a move.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct MoveFlags(u8);
impl MoveFlags {
    pub const NORMAL: Self = Self(0b0000_0001);
    pub const CAPTURE: Self = Self(0b0000_0010);
    pub const BIG_PAWN: Self = Self(0b0000_0100);
    pub const EN_PASSANT: Self = Self(0b0000_1000);
    pub const PROMOTION: Self = Self(0b0001_0000);
    pub const KINGSIDE_CASTLE: Self = Self(0b0010_0000);
    pub const QUEENSIDE_CASTLE: Self = Self(0b0100_0000);

    const LETTERS: [(Self, char); 7] = [
        (Self::NORMAL, 'n'),
        (Self::CAPTURE, 'c'),
        (Self::BIG_PAWN, 'b'),
        (Self::EN_PASSANT, 'e'),
        (Self::PROMOTION, 'p'),
        (Self::KINGSIDE_CASTLE, 'k'),
        (Self::QUEENSIDE_CASTLE, 'q'),
    ];

    /// Checks if all flags of `other` are set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets all flags of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0
    }

    /// Checks if the move takes a piece, en passant included.
    #[inline]
    pub const fn is_capture(self) -> bool {
        self.0 & (Self::CAPTURE.0 | Self::EN_PASSANT.0) != 0
    }

    /// Checks if the move is a castle on either side.
    #[inline]
    pub const fn is_castle(self) -> bool {
        self.0 & (Self::KINGSIDE_CASTLE.0 | Self::QUEENSIDE_CASTLE.0) != 0
    }
}
impl std::ops::BitOr for MoveFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
/// Writes the flag string: one letter per flag, in `ncbepkq` order.
impl std::fmt::Display for MoveFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (flag, letter) in Self::LETTERS {
            if self.contains(flag) {
                write!(f, "{letter}")?
            }
        }
        Ok(())
    }
}

/// A pseudo-legal move on a given position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub colour: Colour,
    pub flags: MoveFlags,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    /// Time at which the move was applied, `0` until then.
    pub time: Timestamp,
    pub san: San,
}
impl Move {
    /// Wire representation of this move.
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    /// Checks if two moves do the same thing, whatever their time and SAN.
    pub fn same_action(&self, other: &Move) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.piece == other.piece
            && self.colour == other.colour
            && self.flags == other.flags
            && self.captured == other.captured
            && self.promotion == other.promotion
    }

    /// Checks if this move answers a request.
    ///
    /// A promotion request without a piece is read as a queen promotion.
    pub fn matches(&self, request: &MoveRequest) -> bool {
        self.from == request.from
            && self.to == request.to
            && match (self.promotion, request.promotion) {
                (None, None) => true,
                (Some(kind), None) => kind == PieceKind::Queen,
                (promotion, requested) => promotion == requested,
            }
    }
}
impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.san)
    }
}

/// A move as asked for by a player: origin, target and optional promotion.
///
/// Written in pure coordinate notation (`e7e8q`) when displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}
impl MoveRequest {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Same request, promoting to the given piece.
    pub fn promoting_to(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }
}
impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{kind}")?
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[error("Invalid coordinate move")]
pub struct MoveRequestParseError;

impl PartialFromStr for MoveRequest {
    type Err = MoveRequestParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let (from, s) = Square::partial_from_str(s).map_err(|_| MoveRequestParseError)?;
        let (to, s) = Square::partial_from_str(s).map_err(|_| MoveRequestParseError)?;
        let promotion = s
            .chars()
            .next()
            .and_then(PieceKind::from_symbol)
            .filter(|kind| PieceKind::PROMOTIONS.contains(kind));
        match promotion {
            Some(kind) => Ok((Self::new(from, to).promoting_to(kind), &s[1..])),
            None => Ok((Self::new(from, to), s)),
        }
    }
}
impl std::str::FromStr for MoveRequest {
    type Err = MoveRequestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::partial_from_str(s)? {
            (request, "") => Ok(request),
            _ => Err(MoveRequestParseError),
        }
    }
}
