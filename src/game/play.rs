//! # Games
//! A game owns a position and the history of moves applied to it, so that
//! every move can be undone exactly.

use thiserror::Error;

use super::{
    action::{Move, MoveFlags, MoveRequest},
    fen::NFenError,
    history::HistoryEntry,
    movegen::{castling_rook_move, MoveFilter},
    outcome::GameState,
    piece::{Piece, PieceKind, Timestamp},
    position::Position,
    square::Square,
};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
pub enum IllegalMoveError {
    #[error("There is no piece on {0}")]
    EmptySquare(Square),
    #[error("The piece on {square} is cooling down for {remaining}ms")]
    CoolingDown { square: Square, remaining: Timestamp },
    #[error("{0} is not a legal move")]
    NotLegal(MoveRequest),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Game {
    position: Position,
    history: Vec<HistoryEntry>,
}
impl Game {
    /// A game on the usual starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// A game starting from an nFEN string.
    pub fn from_nfen(nfen: &str) -> Result<Self, NFenError> {
        Ok(Self::from_position(Position::from_nfen(nfen)?))
    }

    /// A game starting from a given position, with an empty history.
    pub fn from_position(position: Position) -> Self {
        Self {
            position,
            history: vec![],
        }
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Mutable access to the position, for setting headers or cooldown times.
    #[inline]
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    /// nFEN string of the current position.
    pub fn nfen(&self) -> String {
        self.position.nfen()
    }

    /// Moves allowed by the given filter on the current position.
    pub fn moves(&self, filter: MoveFilter) -> Vec<Move> {
        self.position.moves(filter)
    }

    /// Moves played so far, oldest first, with the time they were played at.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &Move> + ExactSizeIterator {
        self.history.iter().map(|entry| &entry.played)
    }

    pub fn state(&self) -> GameState {
        self.position.state()
    }

    /// Finds the move matching a request among the moves the filter allows,
    /// and applies it at the filter's time.
    pub fn play(
        &mut self,
        request: &MoveRequest,
        filter: MoveFilter,
    ) -> Result<Move, IllegalMoveError> {
        let mv = self.find_move(request, filter)?;
        Ok(self.apply_unchecked(mv, filter.now))
    }

    /// Finds the move matching a request among the moves the filter allows.
    pub fn find_move(
        &self,
        request: &MoveRequest,
        filter: MoveFilter,
    ) -> Result<Move, IllegalMoveError> {
        let piece = self
            .position
            .piece_on(request.from)
            .ok_or(IllegalMoveError::EmptySquare(request.from))?;
        if !piece.is_ready(filter.cooldown, filter.now) {
            return Err(IllegalMoveError::CoolingDown {
                square: request.from,
                remaining: piece.remaining_cooldown(filter.cooldown, filter.now),
            });
        }
        self.position
            .moves(filter.on_square(request.from))
            .into_iter()
            .find(|mv| mv.matches(request))
            .ok_or(IllegalMoveError::NotLegal(*request))
    }

    /// Applies a move generated on the current position at the given time.
    ///
    /// Fails unless the move is still among the moves of the piece on its
    /// origin square, cooldown ignored. The SAN is taken from the current
    /// position.
    pub fn apply_move(&mut self, mv: Move, time: Timestamp) -> Result<Move, IllegalMoveError> {
        if self.position.piece_on(mv.from).is_none() {
            return Err(IllegalMoveError::EmptySquare(mv.from));
        }
        let current = self
            .position
            .moves(MoveFilter::all().on_square(mv.from))
            .into_iter()
            .find(|current| current.same_action(&mv))
            .ok_or(IllegalMoveError::NotLegal(mv.request()))?;
        Ok(self.apply_unchecked(current, time))
    }

    /// Applies a move just generated on the current position.
    pub(crate) fn apply_unchecked(&mut self, mut mv: Move, time: Timestamp) -> Move {
        let position = &mut self.position;
        let us = mv.colour;
        mv.time = time;

        let Some(mover) = position.remove(mv.from) else {
            return mv;
        };
        let rook_move = castling_rook_move(us, mv.flags);
        self.history.push(HistoryEntry {
            played: mv.clone(),
            mover_last_move_time: mover.last_move_time,
            rook_last_move_time: rook_move
                .and_then(|(rook_from, _)| position.piece_on(rook_from))
                .and_then(|rook| rook.last_move_time),
            kings: position.kings,
            castling_rights: position.castling_rights,
            en_passant: position.en_passant,
            move_number: position.move_number,
        });

        if mv.flags.contains(MoveFlags::EN_PASSANT) {
            if let Some(victim) = position.en_passant_victim(mv.to, us) {
                position.remove(victim);
            }
        }

        let kind = mv.promotion.unwrap_or(mover.kind);
        // Capturing a king clears its cached square.
        position.remove(mv.to);
        position.squares[mv.to.index()] = Some(Piece::new(kind, us).moved_at(time));
        if kind == PieceKind::King {
            position.kings[us as usize] = Some(mv.to);
        }

        if let Some((rook_from, rook_to)) = rook_move {
            if let Some(rook) = position.remove(rook_from) {
                position.squares[rook_to.index()] = Some(rook.moved_at(time));
            }
        }

        let rights = &mut position.castling_rights;
        if mover.kind == PieceKind::King {
            rights.disallow(us);
        }
        rights.disallow_rook_corner(mv.from);
        rights.disallow_rook_corner(mv.to);

        position.en_passant = if mv.flags.contains(MoveFlags::BIG_PAWN) {
            mv.from.translate(0, if us.is_black() { -1 } else { 1 })
        } else {
            None
        };
        position.move_number += 1;

        log::debug!("applied {} ({}{}) at {time}", mv.san, mv.from, mv.to);
        mv
    }

    /// Undoes the last move, returning it.
    ///
    /// A captured piece comes back as if it never moved.
    pub fn undo(&mut self) -> Option<Move> {
        let entry = self.history.pop()?;
        let mv = entry.played;
        let position = &mut self.position;
        let us = mv.colour;

        position.squares[mv.to.index()] = None;
        position.squares[mv.from.index()] = Some(Piece {
            kind: mv.piece,
            colour: us,
            last_move_time: entry.mover_last_move_time,
        });

        if let Some(captured) = mv.captured {
            let square = if mv.flags.contains(MoveFlags::EN_PASSANT) {
                mv.to.translate(0, if us.is_black() { 1 } else { -1 })
            } else {
                Some(mv.to)
            };
            if let Some(square) = square {
                position.squares[square.index()] = Some(Piece::new(captured, us.inverse()));
            }
        }

        if let Some((rook_from, rook_to)) = castling_rook_move(us, mv.flags) {
            if let Some(mut rook) = position.squares[rook_to.index()].take() {
                rook.last_move_time = entry.rook_last_move_time;
                position.squares[rook_from.index()] = Some(rook);
            }
        }

        position.kings = entry.kings;
        position.castling_rights = entry.castling_rights;
        position.en_passant = entry.en_passant;
        position.move_number = entry.move_number;
        Some(mv)
    }
}
