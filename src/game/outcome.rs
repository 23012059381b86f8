//! # Game outcome
//! Games end when a king is captured. The only draw is a lack of material to
//! ever capture one.

use super::{colour::Colour, piece::PieceKind, position::Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameState {
    InProgress,
    /// The other colour's king has been captured.
    Won(Colour),
    DrawnInsufficientMaterial,
}
impl GameState {
    /// Checks if the game has ended.
    pub const fn is_over(self) -> bool {
        !matches!(self, GameState::InProgress)
    }

    /// Game result token, as written at the end of a move log.
    pub const fn result_token(self) -> &'static str {
        match self {
            GameState::InProgress => "*",
            GameState::Won(Colour::White) => "1-0",
            GameState::Won(Colour::Black) => "0-1",
            GameState::DrawnInsufficientMaterial => "1/2-1/2",
        }
    }
}
impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameState::InProgress => write!(f, "in progress"),
            GameState::Won(colour) => write!(f, "{colour} wins"),
            GameState::DrawnInsufficientMaterial => write!(f, "draw by insufficient material"),
        }
    }
}

impl Position {
    /// State of the game on this position.
    ///
    /// A missing white king is checked first, so a board with no king at all
    /// counts as a win for black.
    pub fn state(&self) -> GameState {
        if self.king(Colour::White).is_none() {
            GameState::Won(Colour::Black)
        } else if self.king(Colour::Black).is_none() {
            GameState::Won(Colour::White)
        } else if self.insufficient_material() {
            GameState::DrawnInsufficientMaterial
        } else {
            GameState::InProgress
        }
    }

    /// Checks for king against king, a lone minor piece against a king, or
    /// bishops that all stand on squares of the same colour.
    pub fn insufficient_material(&self) -> bool {
        let mut pieces = 0;
        let mut minors = 0;
        let mut bishops = 0;
        let mut light_bishops = 0;
        for (square, piece) in self.pieces() {
            pieces += 1;
            if piece.kind.is_minor() {
                minors += 1;
            }
            if piece.kind == PieceKind::Bishop {
                bishops += 1;
                if square.is_light() {
                    light_bishops += 1;
                }
            }
        }

        match pieces {
            2 => true,
            3 if minors == 1 => true,
            _ => pieces == bishops + 2 && (light_bishops == 0 || light_bishops == bishops),
        }
    }
}
