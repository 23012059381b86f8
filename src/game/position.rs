//! # Position representation
//! A position holds the pieces on the board along with their cooldown state,
//! the cached square of each king, castling rights, the en passant target and
//! the move counter. It has no side to move.

use thiserror::Error;

use super::{
    castling_rights::CastlingRights,
    colour::{Colour, NUM_COLOURS},
    piece::{Piece, PieceKind, Timestamp},
    square::{File, Rank, Square},
};

/// Placing a second king of the same colour on the board.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
#[error("There is already a {0} king on the board")]
pub struct TooManyKings(pub Colour);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) squares: [Option<Piece>; 64],
    pub(crate) kings: [Option<Square>; NUM_COLOURS],
    pub(crate) castling_rights: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) move_number: u32,
    metadata: Vec<(String, String)>,
}
impl Position {
    /// An empty board with no castling rights.
    pub fn empty() -> Self {
        Self {
            squares: [None; 64],
            kings: [None; NUM_COLOURS],
            castling_rights: CastlingRights::none(),
            en_passant: None,
            move_number: 1,
            metadata: vec![],
        }
    }

    /// The usual starting position, where no piece has moved yet.
    pub fn initial() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut position = Self::empty();
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            // SAFETY: `file` is below 8.
            let file = unsafe { File::from_index_unchecked(file as u8) };
            for (colour, back, front) in [
                (Colour::White, Rank::One, Rank::Two),
                (Colour::Black, Rank::Eight, Rank::Seven),
            ] {
                position.squares[Square::new(file, back).index()] = Some(Piece::new(kind, colour));
                position.squares[Square::new(file, front).index()] =
                    Some(Piece::new(PieceKind::Pawn, colour));
            }
        }
        position.kings = [Some(Square::E1), Some(Square::E8)];
        position.castling_rights = CastlingRights::full();
        position
    }

    /// Returns the piece on a given square if any.
    #[inline]
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    /// Places a piece on a square, returning the piece previously there.
    ///
    /// Fails when placing a king of a colour that already has one elsewhere.
    pub fn put(&mut self, square: Square, piece: Piece) -> Result<Option<Piece>, TooManyKings> {
        if piece.kind == PieceKind::King {
            match self.kings[piece.colour as usize] {
                Some(king) if king != square => return Err(TooManyKings(piece.colour)),
                _ => (),
            }
        }
        let previous = self.remove(square);
        if piece.kind == PieceKind::King {
            self.kings[piece.colour as usize] = Some(square)
        }
        self.squares[square.index()] = Some(piece);
        Ok(previous)
    }

    /// Removes the piece on a square, returning it.
    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        let piece = self.squares[square.index()].take()?;
        if piece.kind == PieceKind::King && self.kings[piece.colour as usize] == Some(square) {
            self.kings[piece.colour as usize] = None
        }
        Some(piece)
    }

    /// Square of a colour's king, `None` once it has been captured.
    #[inline]
    pub fn king(&self, colour: Colour) -> Option<Square> {
        self.kings[colour as usize]
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn set_castling_rights(&mut self, rights: CastlingRights) {
        self.castling_rights = rights
    }

    /// Square a pawn skipped over with its last move, if that move was a double push.
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Number of the next move, starting at 1 and counting every half-move.
    #[inline]
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    /// Sets the last move time of the piece on a square.
    ///
    /// Returns `false` if the square is empty.
    pub fn set_last_move_time(&mut self, square: Square, time: Option<Timestamp>) -> bool {
        match &mut self.squares[square.index()] {
            Some(piece) => {
                piece.last_move_time = time;
                true
            }
            None => false,
        }
    }

    /// Pieces on the board with their squares, from A8 to H1.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::squares_fen_iter().filter_map(|square| Some((square, self.piece_on(square)?)))
    }

    /// Value of a header tag.
    pub fn header(&self, tag: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(key, _)| key == tag)
            .map(|(_, value)| value.as_str())
    }

    /// Sets a header tag, keeping its place if it was already set.
    pub fn set_header(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        let (tag, value) = (tag.into(), value.into());
        match self.metadata.iter_mut().find(|(key, _)| *key == tag) {
            Some((_, old)) => *old = value,
            None => self.metadata.push((tag, value)),
        }
    }

    /// Removes a header tag, returning its value.
    pub fn remove_header(&mut self, tag: &str) -> Option<String> {
        let index = self.metadata.iter().position(|(key, _)| key == tag)?;
        Some(self.metadata.remove(index).1)
    }

    /// Header tags in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metadata
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Checks that cached king squares agree with the board.
    pub fn is_consistent(&self) -> bool {
        Colour::iter().all(|colour| {
            let mut kings = self
                .pieces()
                .filter(|(_, piece)| piece.kind == PieceKind::King && piece.colour == colour)
                .map(|(square, _)| square);
            let found = kings.next();
            kings.next().is_none() && found == self.king(colour)
        })
    }
}
impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}
impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, square) in Square::squares_fen_iter().enumerate() {
            if i % 8 == 0 && i != 0 {
                match i / 8 {
                    3 => writeln!(f, "move number: {}", self.move_number),
                    4 => writeln!(
                        f,
                        "en passant: {}",
                        if let Some(square) = self.en_passant {
                            square.to_string()
                        } else {
                            "-".to_string()
                        }
                    ),
                    5 => writeln!(f, "castling rights: {}", self.castling_rights),
                    _ => writeln!(f),
                }?
            }
            match self.piece_on(square) {
                None => write!(f, ". ")?,
                Some(piece) => write!(f, "{piece} ")?,
            }
        }
        writeln!(f)
    }
}
