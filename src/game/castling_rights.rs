//! # Representation of castling rights

use std::str::FromStr;

use super::{colour::Colour, square::Square};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CastlingRights(u8);
impl CastlingRights {
    const KINGSIDE_BLACK: u8 = 0b0001;
    const QUEENSIDE_BLACK: u8 = 0b0010;
    const KINGSIDE_WHITE: u8 = 0b0100;
    const QUEENSIDE_WHITE: u8 = 0b1000;
    const FULL: u8 =
        Self::KINGSIDE_BLACK | Self::KINGSIDE_WHITE | Self::QUEENSIDE_BLACK | Self::QUEENSIDE_WHITE;
    const EMPTY: u8 = 0;

    /// Full castling rights for both sides.
    pub const fn full() -> Self {
        Self(Self::FULL)
    }

    /// No castling rights for any sides.
    pub const fn none() -> Self {
        Self(Self::EMPTY)
    }

    /// Checks if no one can castle.
    pub const fn is_none(self) -> bool {
        self.0 == Self::EMPTY
    }

    /// Checks if kingside castling is allowed for a certain colour.
    #[inline(always)]
    pub const fn kingside_castle_allowed(self, colour: Colour) -> bool {
        if colour.is_black() {
            self.0 & Self::KINGSIDE_BLACK != 0
        } else {
            self.0 & Self::KINGSIDE_WHITE != 0
        }
    }
    /// Checks if queenside castling is allowed for a certain colour.
    #[inline(always)]
    pub const fn queenside_castle_allowed(self, colour: Colour) -> bool {
        if colour.is_black() {
            self.0 & Self::QUEENSIDE_BLACK != 0
        } else {
            self.0 & Self::QUEENSIDE_WHITE != 0
        }
    }

    /// Disallows kingside castling for a given side.
    #[inline(always)]
    pub fn disallow_kingside_castle(&mut self, colour: Colour) {
        self.0 &= if colour.is_black() {
            !Self::KINGSIDE_BLACK
        } else {
            !Self::KINGSIDE_WHITE
        }
    }
    /// Disallows queenside castling for a given side.
    #[inline(always)]
    pub fn disallow_queenside_castle(&mut self, colour: Colour) {
        self.0 &= if colour.is_black() {
            !Self::QUEENSIDE_BLACK
        } else {
            !Self::QUEENSIDE_WHITE
        }
    }
    /// Disallows castling for a given side.
    pub fn disallow(&mut self, colour: Colour) {
        self.0 &= if colour.is_black() {
            !(Self::QUEENSIDE_BLACK | Self::KINGSIDE_BLACK)
        } else {
            !(Self::QUEENSIDE_WHITE | Self::KINGSIDE_WHITE)
        }
    }

    /// Disallows the castle that uses the rook starting on `square`, if any.
    pub fn disallow_rook_corner(&mut self, square: Square) {
        match square {
            Square::H1 => self.disallow_kingside_castle(Colour::White),
            Square::A1 => self.disallow_queenside_castle(Colour::White),
            Square::H8 => self.disallow_kingside_castle(Colour::Black),
            Square::A8 => self.disallow_queenside_castle(Colour::Black),
            _ => (),
        }
    }
}

/// Home square of each colour's king.
pub const fn king_home(colour: Colour) -> Square {
    if colour.is_black() {
        Square::E8
    } else {
        Square::E1
    }
}

/// Starting corner of the rook used when castling on the given side.
pub const fn rook_home(colour: Colour, kingside: bool) -> Square {
    match (colour, kingside) {
        (Colour::White, true) => Square::H1,
        (Colour::White, false) => Square::A1,
        (Colour::Black, true) => Square::H8,
        (Colour::Black, false) => Square::A8,
    }
}

impl FromStr for CastlingRights {
    type Err = ();

    /// Parses `-` or a non-empty subset of `KQkq`, written in that order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Self::none());
        }
        if s.is_empty() {
            return Err(());
        }

        const ORDER: [(char, u8); 4] = [
            ('K', CastlingRights::KINGSIDE_WHITE),
            ('Q', CastlingRights::QUEENSIDE_WHITE),
            ('k', CastlingRights::KINGSIDE_BLACK),
            ('q', CastlingRights::QUEENSIDE_BLACK),
        ];
        let mut rights = 0;
        let mut next = 0;
        for c in s.chars() {
            let offset = ORDER[next..]
                .iter()
                .position(|&(symbol, _)| symbol == c)
                .ok_or(())?;
            next += offset;
            rights |= ORDER[next].1;
            next += 1;
        }
        Ok(Self(rights))
    }
}
impl std::fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            return write!(f, "-");
        }

        if self.kingside_castle_allowed(Colour::White) {
            write!(f, "K")?
        }
        if self.queenside_castle_allowed(Colour::White) {
            write!(f, "Q")?
        }
        if self.kingside_castle_allowed(Colour::Black) {
            write!(f, "k")?
        }
        if self.queenside_castle_allowed(Colour::Black) {
            write!(f, "q")?
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_ordered_subsets() {
        for text in ["KQkq", "K", "Qk", "kq", "q", "Kq", "-"] {
            let rights: CastlingRights = text.parse().unwrap();
            assert_eq!(rights.to_string(), text);
        }
    }

    #[test]
    fn reject_invalid_fields() {
        for text in ["", "QK", "KK", "kQ", "KQkq-", "x", "--", "K-"] {
            assert!(text.parse::<CastlingRights>().is_err(), "{text:?} parsed");
        }
    }

    #[test]
    fn disallow_sides() {
        let mut rights = CastlingRights::full();
        rights.disallow_rook_corner(Square::A8);
        assert_eq!(rights.to_string(), "KQk");
        rights.disallow(Colour::White);
        assert_eq!(rights.to_string(), "k");
        rights.disallow_rook_corner(Square::E4);
        rights.disallow_kingside_castle(Colour::Black);
        assert!(rights.is_none());
    }
}
