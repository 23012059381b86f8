use super::{
    action::Move, castling_rights::CastlingRights, colour::NUM_COLOURS, piece::Timestamp,
    square::Square,
};

/// State needed to undo a move, taken right before it was applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HistoryEntry {
    pub played: Move,
    pub mover_last_move_time: Option<Timestamp>,
    /// Last move time of the rook moved by a castle.
    pub rook_last_move_time: Option<Timestamp>,
    pub kings: [Option<Square>; NUM_COLOURS],
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub move_number: u32,
}
