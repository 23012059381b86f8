//! # Replica
//! Local copy of a hosted game. A replica never moves pieces on its own: it
//! checks requests locally, sends them, and only plays what the authority
//! confirms. Anything it cannot reconcile makes it ask for a fresh snapshot.

use thiserror::Error;

use crate::game::{
    action::{Move, MoveRequest},
    colour::Colour,
    fen::NFenError,
    movegen::MoveFilter,
    outcome::GameState,
    piece::Timestamp,
    play::{Game, IllegalMoveError},
    square::Square,
};

use super::messages::{ClientMessage, GameId, ServerMessage, Snapshot};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum RequestError {
    #[error("No snapshot has been received yet")]
    NotSynced,
    #[error("Observers cannot move pieces")]
    Observer,
    #[error("The piece on {0} does not belong to the player")]
    NotYourPiece(Square),
    #[error(transparent)]
    Illegal(#[from] IllegalMoveError),
}

/// Reasons a replica stops trusting its local game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum DesyncError {
    #[error("A move was confirmed before any snapshot")]
    NoGame,
    #[error("Confirmed move {0} cannot be played locally")]
    UnknownMove(MoveRequest),
    #[error(transparent)]
    InvalidSnapshot(#[from] NFenError),
    #[error("Snapshot has a move time for empty square {0}")]
    EmptyTimedSquare(Square),
    #[error("Move rejected: {0}")]
    Rejected(String),
    #[error("Could not join: {0}")]
    JoinFailed(String),
}

/// What handling a server message did to the replica.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicaEvent {
    /// The local game was rebuilt from a snapshot.
    Synced,
    /// A confirmed move was played, leaving the game in `state`.
    Applied { mv: Move, state: GameState },
    /// The local game was dropped, `request` should be sent to rebuild it.
    Resync {
        request: ClientMessage,
        cause: DesyncError,
    },
    Ignored,
}

#[derive(Clone, Debug)]
pub struct Replica {
    game_id: GameId,
    game: Option<Game>,
    cooldown: Timestamp,
    seat: Option<Colour>,
    /// Game clock minus local clock, in milliseconds.
    clock_offset: i64,
    pending: Vec<MoveRequest>,
}
impl Replica {
    pub fn new(game_id: impl Into<GameId>) -> Self {
        Self {
            game_id: game_id.into(),
            game: None,
            cooldown: 0,
            seat: None,
            clock_offset: 0,
            pending: vec![],
        }
    }

    /// Message seating this replica's player.
    pub fn join(&self) -> ClientMessage {
        ClientMessage::Join {
            game_id: self.game_id.clone(),
        }
    }

    /// Message asking for a fresh snapshot.
    pub fn sync_request(&self) -> ClientMessage {
        ClientMessage::SyncRequest {
            game_id: self.game_id.clone(),
        }
    }

    #[inline]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Local game, `None` until a snapshot arrives.
    #[inline]
    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    #[inline]
    pub fn seat(&self) -> Option<Colour> {
        self.seat
    }

    #[inline]
    pub fn cooldown(&self) -> Timestamp {
        self.cooldown
    }

    /// Requests sent but not yet confirmed, oldest first.
    #[inline]
    pub fn pending(&self) -> &[MoveRequest] {
        &self.pending
    }

    /// Estimated game clock reading at a local clock reading.
    pub fn now(&self, local_now: Timestamp) -> Timestamp {
        (local_now as i64).saturating_add(self.clock_offset).max(0) as Timestamp
    }

    /// Moves the piece on a square can play right now, which is empty for a
    /// piece still cooling down.
    pub fn moves_from(&self, square: Square, local_now: Timestamp) -> Vec<Move> {
        let Some(game) = &self.game else {
            return vec![];
        };
        game.moves(
            MoveFilter::all()
                .on_square(square)
                .with_cooldown(self.cooldown)
                .at(self.now(local_now)),
        )
    }

    /// Checks a request against the local game and returns the message to
    /// send for it. The local game is left untouched.
    pub fn request_move(
        &mut self,
        request: MoveRequest,
        local_now: Timestamp,
    ) -> Result<ClientMessage, RequestError> {
        let game = self.game.as_ref().ok_or(RequestError::NotSynced)?;
        let seat = self.seat.ok_or(RequestError::Observer)?;
        let Some(piece) = game.position().piece_on(request.from) else {
            return Err(IllegalMoveError::EmptySquare(request.from).into());
        };
        if piece.colour != seat {
            return Err(RequestError::NotYourPiece(request.from));
        }
        let filter = MoveFilter::all()
            .with_cooldown(self.cooldown)
            .at(self.now(local_now));
        game.find_move(&request, filter)?;

        self.pending.push(request);
        Ok(ClientMessage::MoveRequest {
            game_id: self.game_id.clone(),
            request,
        })
    }

    /// Applies a message from the authority.
    pub fn handle(&mut self, message: ServerMessage, local_now: Timestamp) -> ReplicaEvent {
        log::info!("{} received {message:?}", self.game_id);
        let result = match message {
            ServerMessage::Snapshot(snapshot) => {
                self.resync(&snapshot, local_now).map(|_| ReplicaEvent::Synced)
            }
            ServerMessage::MoveConfirm { confirmed } => {
                let request = confirmed.request();
                self.confirm(&request, confirmed.time)
            }
            ServerMessage::MoveRejected { reason } => Err(DesyncError::Rejected(reason)),
            ServerMessage::JoinFailed { reason } => Err(DesyncError::JoinFailed(reason)),
            ServerMessage::Created { .. } | ServerMessage::CreateFailed { .. } => {
                Ok(ReplicaEvent::Ignored)
            }
        };
        result.unwrap_or_else(|cause| {
            log::warn!("{} is out of sync: {cause}", self.game_id);
            self.game = None;
            self.pending.clear();
            ReplicaEvent::Resync {
                request: self.sync_request(),
                cause,
            }
        })
    }

    fn resync(&mut self, snapshot: &Snapshot, local_now: Timestamp) -> Result<(), DesyncError> {
        let mut game = Game::from_nfen(&snapshot.nfen)?;
        for (&square, &time) in &snapshot.times {
            if !game.position_mut().set_last_move_time(square, Some(time)) {
                return Err(DesyncError::EmptyTimedSquare(square));
            }
        }
        self.game = Some(game);
        self.cooldown = snapshot.cooldown;
        self.seat = snapshot.colour;
        self.clock_offset = snapshot.game_time() as i64 - local_now as i64;
        self.pending.clear();
        Ok(())
    }

    fn confirm(
        &mut self,
        request: &MoveRequest,
        time: Timestamp,
    ) -> Result<ReplicaEvent, DesyncError> {
        let game = self.game.as_mut().ok_or(DesyncError::NoGame)?;
        // The authority already checked the cooldown with its own clock.
        let mv = game
            .find_move(request, MoveFilter::all())
            .map_err(|_| DesyncError::UnknownMove(*request))?;
        let mv = game.apply_unchecked(mv, time);
        let state = game.state();
        if let Some(index) = self.pending.iter().position(|pending| mv.matches(pending)) {
            self.pending.remove(index);
        }
        if state.is_over() {
            log::info!("{} is over: {state}", self.game_id);
        }
        Ok(ReplicaEvent::Applied { mv, state })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{game::piece::PieceKind, protocols::sync::messages::ConfirmedMove};
    use std::collections::BTreeMap;

    fn snapshot(nfen: &str, times: &[(Square, Timestamp)], colour: Option<Colour>) -> ServerMessage {
        ServerMessage::Snapshot(Snapshot {
            nfen: nfen.to_string(),
            cooldown: 1000,
            times: BTreeMap::from_iter(times.iter().copied()),
            start_time: 500,
            server_time: 3500,
            colour,
        })
    }

    fn synced(colour: Option<Colour>) -> Replica {
        let mut replica = Replica::new("g");
        let event = replica.handle(
            snapshot(crate::game::fen::STARTING_NFEN, &[], colour),
            10_000,
        );
        assert_eq!(event, ReplicaEvent::Synced);
        replica
    }

    #[test]
    fn snapshot_sets_the_clock_offset() {
        let replica = synced(Some(Colour::White));
        assert_eq!(replica.now(10_000), 3000);
        assert_eq!(replica.now(10_250), 3250);
        assert_eq!(replica.now(0), 0);
        assert_eq!(replica.cooldown(), 1000);
        assert_eq!(replica.seat(), Some(Colour::White));
    }

    #[test]
    fn requests_are_checked_locally() {
        let mut replica = Replica::new("g");
        let e2e4 = MoveRequest::new(Square::E2, Square::E4);
        assert_eq!(replica.request_move(e2e4, 0), Err(RequestError::NotSynced));

        let mut observer = synced(None);
        assert_eq!(observer.request_move(e2e4, 10_000), Err(RequestError::Observer));

        let mut replica = synced(Some(Colour::Black));
        assert_eq!(
            replica.request_move(e2e4, 10_000),
            Err(RequestError::NotYourPiece(Square::E2))
        );
        assert_eq!(
            replica.request_move(MoveRequest::new(Square::E7, Square::E3), 10_000),
            Err(RequestError::Illegal(IllegalMoveError::NotLegal(
                MoveRequest::new(Square::E7, Square::E3)
            )))
        );
        let sent = replica
            .request_move(MoveRequest::new(Square::E7, Square::E5), 10_000)
            .unwrap();
        assert_eq!(
            sent,
            ClientMessage::MoveRequest {
                game_id: "g".to_string(),
                request: MoveRequest::new(Square::E7, Square::E5)
            }
        );
        assert_eq!(replica.pending().len(), 1);
        // Nothing moves until the authority confirms.
        assert!(replica.game().unwrap().position().piece_on(Square::E7).is_some());
    }

    #[test]
    fn snapshot_times_gate_requests() {
        let mut replica = Replica::new("g");
        replica.handle(
            snapshot(
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR KQkq 2",
                &[(Square::E4, 2500)],
                Some(Colour::White),
            ),
            10_000,
        );
        let e4e5 = MoveRequest::new(Square::E4, Square::E5);
        assert!(replica.moves_from(Square::E4, 10_000).is_empty());
        assert_eq!(
            replica.request_move(e4e5, 10_000),
            Err(RequestError::Illegal(IllegalMoveError::CoolingDown {
                square: Square::E4,
                remaining: 500
            }))
        );
        assert_eq!(replica.moves_from(Square::E4, 10_500).len(), 1);
        assert!(replica.request_move(e4e5, 10_500).is_ok());
    }

    #[test]
    fn confirmations_are_applied() {
        let mut replica = synced(Some(Colour::White));
        let g1f3 = MoveRequest::new(Square::G1, Square::F3);
        replica.request_move(g1f3, 10_000).unwrap();
        let event = replica.handle(
            ServerMessage::MoveConfirm {
                confirmed: ConfirmedMove {
                    from: Square::G1,
                    to: Square::F3,
                    promotion: None,
                    time: 3100,
                },
            },
            10_100,
        );
        let ReplicaEvent::Applied { mv, state } = event else {
            panic!("expected the move to be applied, got {event:?}");
        };
        assert_eq!((mv.san.as_str(), mv.time), ("Nf3", 3100));
        assert_eq!(state, GameState::InProgress);
        assert!(replica.pending().is_empty());

        // Moves of the opponent are confirmed too, regardless of local timing.
        let event = replica.handle(
            ServerMessage::MoveConfirm {
                confirmed: ConfirmedMove {
                    from: Square::D7,
                    to: Square::D5,
                    promotion: None,
                    time: 3150,
                },
            },
            10_000,
        );
        assert!(matches!(event, ReplicaEvent::Applied { .. }));
        let position = replica.game().unwrap().position();
        assert_eq!(
            position.piece_on(Square::D5).and_then(|piece| piece.last_move_time),
            Some(3150)
        );
    }

    fn confirm(from: Square, to: Square, promotion: Option<PieceKind>, time: Timestamp) -> ServerMessage {
        ServerMessage::MoveConfirm {
            confirmed: ConfirmedMove {
                from,
                to,
                promotion,
                time,
            },
        }
    }

    #[test]
    fn default_promotions_clear_pending_requests() {
        let mut replica = Replica::new("g");
        replica.handle(snapshot("3k4/P7/8/8/8/8/8/4K3 - 1", &[], Some(Colour::White)), 0);
        replica
            .request_move(MoveRequest::new(Square::A7, Square::A8), 0)
            .unwrap();
        let king_step = MoveRequest::new(Square::E1, Square::E2);
        replica.request_move(king_step, 0).unwrap();

        let event = replica.handle(confirm(Square::A7, Square::A8, Some(PieceKind::Queen), 10), 0);
        assert!(matches!(
            event,
            ReplicaEvent::Applied {
                state: GameState::InProgress,
                ..
            }
        ));
        assert_eq!(replica.pending(), [king_step]);
    }

    #[test]
    fn confirmations_report_the_end_of_the_game() {
        let mut replica = Replica::new("g");
        replica.handle(snapshot("3k4/8/8/8/8/8/8/Q3K3 - 1", &[], None), 0);
        let event = replica.handle(confirm(Square::A1, Square::D4, None, 10), 0);
        assert!(matches!(event, ReplicaEvent::Applied { state: GameState::InProgress, .. }));
        let event = replica.handle(confirm(Square::D4, Square::D8, None, 20), 0);
        let ReplicaEvent::Applied { mv, state } = event else {
            panic!("expected the capture to be applied, got {event:?}");
        };
        assert_eq!(mv.captured, Some(PieceKind::King));
        assert_eq!(state, GameState::Won(Colour::White));
    }

    #[test]
    fn desync_asks_for_a_snapshot() {
        let mut replica = synced(Some(Colour::White));
        let event = replica.handle(
            ServerMessage::MoveConfirm {
                confirmed: ConfirmedMove {
                    from: Square::E2,
                    to: Square::E5,
                    promotion: None,
                    time: 3100,
                },
            },
            10_100,
        );
        assert_eq!(
            event,
            ReplicaEvent::Resync {
                request: replica.sync_request(),
                cause: DesyncError::UnknownMove(MoveRequest::new(Square::E2, Square::E5)),
            }
        );
        assert!(replica.game().is_none());

        let mut replica = synced(Some(Colour::White));
        let event = replica.handle(
            ServerMessage::MoveRejected {
                reason: "too early".to_string(),
            },
            10_100,
        );
        assert!(matches!(
            event,
            ReplicaEvent::Resync {
                cause: DesyncError::Rejected(_),
                ..
            }
        ));
    }

    #[test]
    fn invalid_snapshots_are_refused() {
        let mut replica = Replica::new("g");
        let event = replica.handle(snapshot("8/8/8/8/8/8/8/8 - 1", &[(Square::A1, 10)], None), 0);
        assert!(matches!(
            event,
            ReplicaEvent::Resync {
                cause: DesyncError::EmptyTimedSquare(Square::A1),
                ..
            }
        ));
        let event = replica.handle(snapshot("8/8 - 1", &[], None), 0);
        assert!(matches!(
            event,
            ReplicaEvent::Resync {
                cause: DesyncError::InvalidSnapshot(_),
                ..
            }
        ));
        assert_eq!(
            replica.handle(
                ServerMessage::Created {
                    game_id: "g".to_string()
                },
                0
            ),
            ReplicaEvent::Ignored
        );
    }
}
