//! # nFEN string utilities
//! nFEN is FEN without a side to move, halfmove clock or en passant field:
//! `<placement> <castling> <move number>`. Cooldown state is not part of it.

use thiserror::Error;

use super::{
    castling_rights::CastlingRights,
    colour::Colour,
    piece::Piece,
    position::{Position, TooManyKings},
    square::{File, Rank, Square},
};

/// nFEN of the usual starting position.
pub const STARTING_NFEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR KQkq 1";

/// nFEN parsing errors, reported in the order the fields are checked.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
pub enum NFenError {
    #[error("nFEN must contain exactly 3 fields, found {0}")]
    MalformedField(usize),
    #[error("Move number must be a positive integer")]
    InvalidMoveNumber,
    #[error("Castling field must be `-` or an ordered subset of `KQkq`")]
    InvalidCastlingField,
    #[error("Piece placement must contain 8 ranks, found {0}")]
    InvalidRankCount(usize),
    #[error("Rank {rank} of the piece placement is invalid")]
    InvalidRankContent { rank: u8 },
    #[error("Piece placement holds more than one {0} king")]
    TooManyKings(Colour),
}
impl From<TooManyKings> for NFenError {
    fn from(TooManyKings(colour): TooManyKings) -> Self {
        Self::TooManyKings(colour)
    }
}

/// Checks an nFEN string without building a position.
pub fn validate_nfen(nfen: &str) -> Result<(), NFenError> {
    Position::from_nfen(nfen).map(|_| ())
}

impl Position {
    /// Parses an nFEN string. Pieces of the new position have never moved.
    pub fn from_nfen(nfen: &str) -> Result<Self, NFenError> {
        let fields: Vec<&str> = nfen.split_whitespace().collect();
        let [placement, castling, move_number] = fields[..] else {
            return Err(NFenError::MalformedField(fields.len()));
        };

        if move_number.is_empty() || !move_number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NFenError::InvalidMoveNumber);
        }
        let move_number: u32 = move_number
            .parse()
            .map_err(|_| NFenError::InvalidMoveNumber)?;
        if move_number == 0 {
            return Err(NFenError::InvalidMoveNumber);
        }

        let castling_rights: CastlingRights = castling
            .parse()
            .map_err(|_| NFenError::InvalidCastlingField)?;

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(NFenError::InvalidRankCount(ranks.len()));
        }

        let mut position = Position::empty();
        for (row, text) in ranks.into_iter().enumerate() {
            let rank_number = 8 - row as u8;
            let invalid = NFenError::InvalidRankContent { rank: rank_number };
            // SAFETY: `row` is below 8.
            let rank = unsafe { Rank::from_index_unchecked(rank_number - 1) };

            let mut file = 0u8;
            let mut previous_was_digit = false;
            for c in text.chars() {
                match c {
                    '1'..='8' => {
                        if previous_was_digit {
                            return Err(invalid);
                        }
                        previous_was_digit = true;
                        file += c as u8 - b'0';
                    }
                    _ => {
                        previous_was_digit = false;
                        let piece = Piece::from_symbol(c).map_err(|_| invalid)?;
                        let square = Square::new(File::from_index(file).ok_or(invalid)?, rank);
                        position.put(square, piece)?;
                        file += 1;
                    }
                }
                if file > 8 {
                    return Err(invalid);
                }
            }
            if file != 8 {
                return Err(invalid);
            }
        }

        position.castling_rights = castling_rights;
        position.move_number = move_number;
        Ok(position)
    }

    /// nFEN string of this position.
    pub fn nfen(&self) -> String {
        let mut placement = String::new();
        for (i, square) in Square::squares_fen_iter().enumerate() {
            if i % 8 == 0 && i != 0 {
                placement.push('/');
            }
            match self.piece_on(square) {
                Some(piece) => placement.push(piece.symbol()),
                None => match placement.pop() {
                    Some(c @ '1'..='7') => placement.push((c as u8 + 1) as char),
                    Some(c) => {
                        placement.push(c);
                        placement.push('1');
                    }
                    None => placement.push('1'),
                },
            }
        }
        format!("{placement} {} {}", self.castling_rights, self.move_number)
    }
}
impl std::str::FromStr for Position {
    type Err = NFenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_nfen(s)
    }
}
