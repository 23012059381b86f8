//! # Sync messages
//! Messages exchanged between replicas and the authority, serialized as JSON
//! objects tagged by their `type` field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::{
    action::{Move, MoveRequest},
    colour::Colour,
    piece::{PieceKind, Timestamp},
    play::Game,
    square::Square,
};

/// Identifier of a hosted game.
pub type GameId = String;

/// Identifier of a connected player.
pub type PlayerId = String;

/// Messages sent by replicas to the authority.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Hosts a new game, from the starting position unless an nFEN is given.
    Create {
        game_id: GameId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nfen: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cooldown: Option<Timestamp>,
    },
    Join {
        game_id: GameId,
    },
    SyncRequest {
        game_id: GameId,
    },
    MoveRequest {
        game_id: GameId,
        #[serde(rename = "move")]
        request: MoveRequest,
    },
}
impl ClientMessage {
    pub fn game_id(&self) -> &str {
        match self {
            Self::Create { game_id, .. }
            | Self::Join { game_id }
            | Self::SyncRequest { game_id }
            | Self::MoveRequest { game_id, .. } => game_id,
        }
    }
}

/// Messages sent by the authority to replicas.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Snapshot(Snapshot),
    Created {
        game_id: GameId,
    },
    CreateFailed {
        reason: String,
    },
    JoinFailed {
        reason: String,
    },
    MoveConfirm {
        #[serde(rename = "move")]
        confirmed: ConfirmedMove,
    },
    MoveRejected {
        reason: String,
    },
}

/// Full state of a hosted game, enough for a replica to rebuild it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot {
    pub nfen: String,
    pub cooldown: Timestamp,
    /// Last move time of every piece that moved, on the game clock.
    pub times: BTreeMap<Square, Timestamp>,
    /// Authority clock reading when the game clock started.
    pub start_time: Timestamp,
    /// Authority clock reading when this snapshot was taken.
    pub server_time: Timestamp,
    /// Colour of the receiving player, `null` for observers.
    pub colour: Option<Colour>,
}
impl Snapshot {
    /// Snapshot of a game for the player seated as `colour`.
    pub fn new(
        game: &Game,
        cooldown: Timestamp,
        start_time: Timestamp,
        server_time: Timestamp,
        colour: Option<Colour>,
    ) -> Self {
        let times = game
            .position()
            .pieces()
            .filter_map(|(square, piece)| Some((square, piece.last_move_time?)))
            .collect();
        Self {
            nfen: game.nfen(),
            cooldown,
            times,
            start_time,
            server_time,
            colour,
        }
    }

    /// Milliseconds elapsed on the game clock when this snapshot was taken.
    pub fn game_time(&self) -> Timestamp {
        self.server_time.saturating_sub(self.start_time)
    }
}

/// A move accepted by the authority, stamped with game clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmedMove {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
    pub time: Timestamp,
}
impl ConfirmedMove {
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}
impl From<&Move> for ConfirmedMove {
    fn from(mv: &Move) -> Self {
        Self {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            time: mv.time,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::movegen::MoveFilter;

    #[test]
    fn client_messages_are_tagged() {
        let request = ClientMessage::MoveRequest {
            game_id: "g1".to_string(),
            request: MoveRequest::new(Square::E7, Square::E8).promoting_to(PieceKind::Knight),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"type":"move_request","game_id":"g1","move":{"from":"e7","to":"e8","promotion":"n"}}"#
        );
        assert_eq!(serde_json::from_str::<ClientMessage>(&json).unwrap(), request);

        let join: ClientMessage =
            serde_json::from_str(r#"{"type":"join","game_id":"g2"}"#).unwrap();
        assert_eq!(join.game_id(), "g2");
        let create: ClientMessage =
            serde_json::from_str(r#"{"type":"create","game_id":"g3","cooldown":500}"#).unwrap();
        assert_eq!(
            create,
            ClientMessage::Create {
                game_id: "g3".to_string(),
                nfen: None,
                cooldown: Some(500)
            }
        );
    }

    #[test]
    fn bad_squares_are_refused() {
        assert!(serde_json::from_str::<ClientMessage>(
            r#"{"type":"move_request","game_id":"g","move":{"from":"e9","to":"e4"}}"#
        )
        .is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"resign","game_id":"g"}"#).is_err());
    }

    #[test]
    fn snapshot_lists_moved_pieces() {
        let mut game = Game::new();
        game.play(
            &MoveRequest::new(Square::E2, Square::E4),
            MoveFilter::all().at(1500),
        )
        .unwrap();
        let snapshot = Snapshot::new(&game, 4000, 100, 2100, Some(Colour::Black));
        assert_eq!(snapshot.times, BTreeMap::from([(Square::E4, 1500)]));
        assert_eq!(snapshot.game_time(), 2000);

        let json = serde_json::to_value(ServerMessage::Snapshot(snapshot.clone())).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["times"]["e4"], 1500);
        assert_eq!(json["colour"], "b");
        assert_eq!(
            serde_json::from_value::<ServerMessage>(json).unwrap(),
            ServerMessage::Snapshot(snapshot)
        );
    }

    #[test]
    fn confirmations_carry_time() {
        let confirm = ServerMessage::MoveConfirm {
            confirmed: ConfirmedMove {
                from: Square::G1,
                to: Square::F3,
                promotion: None,
                time: 4200,
            },
        };
        assert_eq!(
            serde_json::to_string(&confirm).unwrap(),
            r#"{"type":"move_confirm","move":{"from":"g1","to":"f3","time":4200}}"#
        );
    }
}
