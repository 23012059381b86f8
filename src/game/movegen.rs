//! # Move generation
//! Pseudo-legal move generation: pieces move according to the usual rules,
//! without any test of king safety. Capturing the king is how games are won.
//!
//! There is no side to move. Instead, every piece waits for a cooldown after
//! each of its moves, and pieces still cooling down are skipped.

use std::fmt::Write;

use super::{
    action::{Move, MoveFlags, San},
    castling_rights::{king_home, rook_home},
    colour::Colour,
    piece::{Piece, PieceKind, Timestamp},
    position::Position,
    square::{Rank, Square},
};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, 1),
    (-1, 2),
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
];
const BISHOP_OFFSETS: [(i8, i8); 4] = [(-1, 1), (1, 1), (1, -1), (-1, -1)];
const ROOK_OFFSETS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const ROYAL_OFFSETS: [(i8, i8); 8] = [
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
];

/// Which moves to generate, and at what time.
///
/// The default filter generates moves for every square, with no cooldown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveFilter {
    pub square: Option<Square>,
    pub cooldown: Timestamp,
    pub now: Timestamp,
}
impl MoveFilter {
    /// Moves of every piece, ignoring cooldowns.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only generates moves of the piece on the given square.
    pub fn on_square(mut self, square: Square) -> Self {
        self.square = Some(square);
        self
    }

    /// Skips pieces that moved less than `cooldown` milliseconds ago.
    pub fn with_cooldown(mut self, cooldown: Timestamp) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Sets the current time of the game clock.
    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }
}

/// Direction pawns of a given colour move in.
const fn pawn_direction(colour: Colour) -> i8 {
    if colour.is_black() {
        -1
    } else {
        1
    }
}

const fn pawn_start_rank(colour: Colour) -> Rank {
    if colour.is_black() {
        Rank::Seven
    } else {
        Rank::Two
    }
}

/// Files pawns capture towards, in generation order.
const fn pawn_capture_files(colour: Colour) -> [i8; 2] {
    if colour.is_black() {
        [1, -1]
    } else {
        [-1, 1]
    }
}

impl Position {
    /// Generates the moves allowed by a filter, in A8 to H1 square order.
    pub fn moves(&self, filter: MoveFilter) -> Vec<Move> {
        let mut moves = vec![];
        match filter.square {
            Some(square) => self.piece_moves_filtered(square, filter, &mut moves),
            None => {
                for square in Square::squares_fen_iter() {
                    self.piece_moves_filtered(square, filter, &mut moves)
                }
            }
        }
        for mv in &mut moves {
            mv.san = self.san(mv);
        }
        moves
    }

    fn piece_moves_filtered(&self, square: Square, filter: MoveFilter, moves: &mut Vec<Move>) {
        if let Some(piece) = self.piece_on(square) {
            if piece.is_ready(filter.cooldown, filter.now) {
                self.piece_moves(square, piece, moves)
            }
        }
    }

    /// Pushes all moves of a piece, without their algebraic notation.
    fn piece_moves(&self, from: Square, piece: Piece, moves: &mut Vec<Move>) {
        match piece.kind {
            PieceKind::Pawn => self.pawn_moves(from, piece.colour, moves),
            PieceKind::Knight => self.step_moves(from, piece, &KNIGHT_OFFSETS, false, moves),
            PieceKind::Bishop => self.step_moves(from, piece, &BISHOP_OFFSETS, true, moves),
            PieceKind::Rook => self.step_moves(from, piece, &ROOK_OFFSETS, true, moves),
            PieceKind::Queen => self.step_moves(from, piece, &ROYAL_OFFSETS, true, moves),
            PieceKind::King => {
                self.step_moves(from, piece, &ROYAL_OFFSETS, false, moves);
                self.castling_moves(from, piece.colour, moves)
            }
        }
    }

    fn pawn_moves(&self, from: Square, colour: Colour, moves: &mut Vec<Move>) {
        let direction = pawn_direction(colour);

        if let Some(single) = from.translate(0, direction) {
            if self.piece_on(single).is_none() {
                self.push_pawn_move(from, single, colour, MoveFlags::NORMAL, None, moves);
                if from.rank() == pawn_start_rank(colour) {
                    if let Some(double) = from.translate(0, 2 * direction) {
                        if self.piece_on(double).is_none() {
                            self.push_pawn_move(
                                from,
                                double,
                                colour,
                                MoveFlags::BIG_PAWN,
                                None,
                                moves,
                            );
                        }
                    }
                }
            }
        }

        for files in pawn_capture_files(colour) {
            let Some(target) = from.translate(files, direction) else {
                continue;
            };
            match self.piece_on(target) {
                Some(victim) if victim.colour != colour => self.push_pawn_move(
                    from,
                    target,
                    colour,
                    MoveFlags::CAPTURE,
                    Some(victim.kind),
                    moves,
                ),
                None if Some(target) == self.en_passant
                    && self.en_passant_victim(target, colour).is_some() =>
                {
                    self.push_pawn_move(
                        from,
                        target,
                        colour,
                        MoveFlags::EN_PASSANT,
                        Some(PieceKind::Pawn),
                        moves,
                    )
                }
                _ => (),
            }
        }
    }

    /// Square of the enemy pawn taken by an en passant capture onto `target`.
    pub(crate) fn en_passant_victim(&self, target: Square, colour: Colour) -> Option<Square> {
        let behind = target.translate(0, -pawn_direction(colour))?;
        match self.piece_on(behind) {
            Some(piece) if piece.kind == PieceKind::Pawn && piece.colour != colour => Some(behind),
            _ => None,
        }
    }

    /// Pushes a pawn move, expanded into one move per promotion on the last rank.
    fn push_pawn_move(
        &self,
        from: Square,
        to: Square,
        colour: Colour,
        flags: MoveFlags,
        captured: Option<PieceKind>,
        moves: &mut Vec<Move>,
    ) {
        if matches!(to.rank(), Rank::One | Rank::Eight) {
            for kind in PieceKind::PROMOTIONS {
                moves.push(new_move(
                    from,
                    to,
                    PieceKind::Pawn,
                    colour,
                    flags | MoveFlags::PROMOTION,
                    captured,
                    Some(kind),
                ))
            }
        } else {
            moves.push(new_move(
                from,
                to,
                PieceKind::Pawn,
                colour,
                flags,
                captured,
                None,
            ))
        }
    }

    /// Pushes moves along the given offsets, once or repeatedly for sliders.
    fn step_moves(
        &self,
        from: Square,
        piece: Piece,
        offsets: &[(i8, i8)],
        slides: bool,
        moves: &mut Vec<Move>,
    ) {
        for &(files, ranks) in offsets {
            let mut current = from;
            while let Some(to) = current.translate(files, ranks) {
                match self.piece_on(to) {
                    None => moves.push(new_move(
                        from,
                        to,
                        piece.kind,
                        piece.colour,
                        MoveFlags::NORMAL,
                        None,
                        None,
                    )),
                    Some(other) => {
                        if other.colour != piece.colour {
                            moves.push(new_move(
                                from,
                                to,
                                piece.kind,
                                piece.colour,
                                MoveFlags::CAPTURE,
                                Some(other.kind),
                                None,
                            ))
                        }
                        break;
                    }
                }
                if !slides {
                    break;
                }
                current = to;
            }
        }
    }

    /// Castling needs the king on its home square, the right, and empty squares
    /// up to the rook. Attacked squares do not matter.
    fn castling_moves(&self, from: Square, colour: Colour, moves: &mut Vec<Move>) {
        if from != king_home(colour) {
            return;
        }
        let empty = |files: &[i8]| {
            files.iter().all(|&df| {
                from.translate(df, 0)
                    .is_some_and(|square| self.piece_on(square).is_none())
            })
        };

        if self.castling_rights.kingside_castle_allowed(colour) && empty(&[1, 2]) {
            if let Some(to) = from.translate(2, 0) {
                moves.push(new_move(
                    from,
                    to,
                    PieceKind::King,
                    colour,
                    MoveFlags::KINGSIDE_CASTLE,
                    None,
                    None,
                ))
            }
        }
        if self.castling_rights.queenside_castle_allowed(colour) && empty(&[-1, -2, -3]) {
            if let Some(to) = from.translate(-2, 0) {
                moves.push(new_move(
                    from,
                    to,
                    PieceKind::King,
                    colour,
                    MoveFlags::QUEENSIDE_CASTLE,
                    None,
                    None,
                ))
            }
        }
    }

    /// Checks if the piece on `from` could move to `to`, cooldown ignored.
    fn reaches(&self, from: Square, to: Square) -> bool {
        let Some(piece) = self.piece_on(from) else {
            return false;
        };
        let mut moves = vec![];
        self.piece_moves(from, piece, &mut moves);
        moves.iter().any(|mv| mv.to == to)
    }

    /// Algebraic notation of a move on this position.
    ///
    /// Pieces are disambiguated against every other piece of the same kind and
    /// colour that could reach the same square, regardless of cooldowns, so the
    /// notation of a move does not depend on the game clock.
    pub fn san(&self, mv: &Move) -> San {
        let mut san = San::new();
        if mv.flags.contains(MoveFlags::KINGSIDE_CASTLE) {
            let _ = san.push_str("O-O");
            return san;
        }
        if mv.flags.contains(MoveFlags::QUEENSIDE_CASTLE) {
            let _ = san.push_str("O-O-O");
            return san;
        }

        if mv.piece == PieceKind::Pawn {
            if mv.flags.is_capture() {
                let _ = write!(san, "{}x", mv.from.file());
            }
            let _ = write!(san, "{}", mv.to);
            if let Some(kind) = mv.promotion {
                let _ = write!(san, "={}", kind.san_symbol());
            }
            return san;
        }

        let _ = san.push(mv.piece.san_symbol());
        if mv.piece != PieceKind::King {
            let rivals: Vec<Square> = self
                .pieces()
                .filter(|&(square, piece)| {
                    square != mv.from
                        && piece.kind == mv.piece
                        && piece.colour == mv.colour
                        && self.reaches(square, mv.to)
                })
                .map(|(square, _)| square)
                .collect();
            if !rivals.is_empty() {
                let same_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
                let same_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
                if !same_file {
                    let _ = write!(san, "{}", mv.from.file());
                } else if !same_rank {
                    let _ = write!(san, "{}", mv.from.rank());
                } else {
                    let _ = write!(san, "{}", mv.from);
                }
            }
        }
        if mv.flags.is_capture() {
            let _ = san.push('x');
        }
        let _ = write!(san, "{}", mv.to);
        san
    }
}

fn new_move(
    from: Square,
    to: Square,
    piece: PieceKind,
    colour: Colour,
    flags: MoveFlags,
    captured: Option<PieceKind>,
    promotion: Option<PieceKind>,
) -> Move {
    Move {
        from,
        to,
        piece,
        colour,
        flags,
        captured,
        promotion,
        time: 0,
        san: San::new(),
    }
}

/// Rook move that goes with a castle of the king onto `to`.
pub(crate) fn castling_rook_move(colour: Colour, flags: MoveFlags) -> Option<(Square, Square)> {
    if flags.contains(MoveFlags::KINGSIDE_CASTLE) {
        Some((rook_home(colour, true), king_home(colour).translate(1, 0)?))
    } else if flags.contains(MoveFlags::QUEENSIDE_CASTLE) {
        Some((rook_home(colour, false), king_home(colour).translate(-1, 0)?))
    } else {
        None
    }
}
