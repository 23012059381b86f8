//! # Authority
//! The authority owns the binding copy of every hosted game. It serializes
//! move requests, stamps them with its own clock and tells every replica about
//! the moves it accepted.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use serde::Serialize;
use thiserror::Error;

use crate::game::{
    action::MoveRequest,
    colour::Colour,
    fen::NFenError,
    movegen::MoveFilter,
    outcome::GameState,
    piece::Timestamp,
    play::{Game, IllegalMoveError},
    square::Square,
};

use super::messages::{ClientMessage, ConfirmedMove, GameId, PlayerId, ServerMessage, Snapshot};

/// Cooldown of hosted games unless configured otherwise, in milliseconds.
pub const DEFAULT_COOLDOWN: Timestamp = 4_000;

/// Idle games are dropped after an hour.
pub const DEFAULT_MAX_IDLE: Timestamp = 3_600_000;

/// Source of monotonic milliseconds.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Milliseconds elapsed since the clock was created.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}
impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}
impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst)
    }

    pub fn advance(&self, milliseconds: Timestamp) {
        self.now.fetch_add(milliseconds, Ordering::SeqCst);
    }
}
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Builder pattern to configure hosted games.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GameConfig {
    pub cooldown: Timestamp,
    pub max_idle: Timestamp,
}
impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}
impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds a piece waits after each of its moves.
    pub fn with_cooldown(mut self, cooldown: Timestamp) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Milliseconds without any move after which a game is dropped.
    pub fn with_max_idle(mut self, max_idle: Timestamp) -> Self {
        self.max_idle = max_idle;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// Waiting for both seats to be taken.
    Waiting,
    Playing,
    Finished(GameState),
}
impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Waiting => write!(f, "waiting for players"),
            GameStatus::Playing => write!(f, "playing"),
            GameStatus::Finished(state) => write!(f, "finished, {state}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum CreateError {
    #[error("Game {0} already exists")]
    AlreadyExists(GameId),
    #[error(transparent)]
    InvalidNFen(#[from] NFenError),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum JoinError {
    #[error("Unknown game {0}")]
    UnknownGame(GameId),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum MoveRejection {
    #[error("Unknown game {0}")]
    UnknownGame(GameId),
    #[error("Game is not being played ({0})")]
    NotPlaying(GameStatus),
    #[error("The piece on {0} does not belong to the player")]
    NotYourPiece(Square),
    #[error(transparent)]
    Illegal(#[from] IllegalMoveError),
}

/// A game along with its players and clock.
#[derive(Clone, Debug)]
pub struct HostedGame {
    game: Game,
    config: GameConfig,
    start_time: Timestamp,
    last_activity: Timestamp,
    white: Option<PlayerId>,
    black: Option<PlayerId>,
    status: GameStatus,
}
impl HostedGame {
    fn new(game: Game, config: GameConfig, now: Timestamp) -> Self {
        Self {
            game,
            config,
            start_time: now,
            last_activity: now,
            white: None,
            black: None,
            status: GameStatus::Waiting,
        }
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn config(&self) -> GameConfig {
        self.config
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Authority clock reading when the game clock started.
    #[inline]
    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// Player seated on a colour.
    pub fn player(&self, colour: Colour) -> Option<&str> {
        match colour {
            Colour::White => self.white.as_deref(),
            Colour::Black => self.black.as_deref(),
        }
    }

    /// Colour a player is seated as, `None` for observers.
    pub fn seat_of(&self, player: &str) -> Option<Colour> {
        Colour::iter().find(|&colour| self.player(colour) == Some(player))
    }

    /// Game clock reading for a given authority clock reading.
    pub fn game_time(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.start_time)
    }

    pub fn snapshot(&self, now: Timestamp, colour: Option<Colour>) -> Snapshot {
        Snapshot::new(
            &self.game,
            self.config.cooldown,
            self.start_time,
            now,
            colour,
        )
    }

    /// Seats a player on the first free colour, white first. Players already
    /// seated keep their colour and late comers observe.
    fn seat(&mut self, player: &str, now: Timestamp) -> Option<Colour> {
        if let Some(colour) = self.seat_of(player) {
            return Some(colour);
        }
        let colour = if self.white.is_none() {
            self.white = Some(player.to_string());
            Colour::White
        } else if self.black.is_none() {
            self.black = Some(player.to_string());
            Colour::Black
        } else {
            return None;
        };
        if self.status == GameStatus::Waiting && self.black.is_some() && self.white.is_some() {
            // The game clock starts with the game.
            self.start_time = now;
            self.status = GameStatus::Playing;
            log::info!("both seats taken, game started at {now}");
        }
        Some(colour)
    }
}

/// Outgoing message, sent to a single player or to everyone in the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outbound {
    pub game_id: GameId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<PlayerId>,
    #[serde(flatten)]
    pub message: ServerMessage,
}

pub struct Authority<C: Clock> {
    clock: C,
    default_config: GameConfig,
    games: BTreeMap<GameId, HostedGame>,
}
impl<C: Clock> Authority<C> {
    pub fn new(clock: C, default_config: GameConfig) -> Self {
        Self {
            clock,
            default_config,
            games: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn game(&self, game_id: &str) -> Option<&HostedGame> {
        self.games.get(game_id)
    }

    /// Number of games currently hosted.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Hosts a new game on the starting position.
    pub fn create_game(
        &mut self,
        game_id: impl Into<GameId>,
        config: GameConfig,
    ) -> Result<&HostedGame, CreateError> {
        self.host(game_id.into(), Game::new(), config)
    }

    /// Hosts a new game on a given position.
    pub fn create_game_from_nfen(
        &mut self,
        game_id: impl Into<GameId>,
        nfen: &str,
        config: GameConfig,
    ) -> Result<&HostedGame, CreateError> {
        let game = Game::from_nfen(nfen)?;
        self.host(game_id.into(), game, config)
    }

    fn host(
        &mut self,
        game_id: GameId,
        game: Game,
        config: GameConfig,
    ) -> Result<&HostedGame, CreateError> {
        if self.games.contains_key(&game_id) {
            return Err(CreateError::AlreadyExists(game_id));
        }
        log::info!("hosting game {game_id} with a {}ms cooldown", config.cooldown);
        let hosted = HostedGame::new(game, config, self.clock.now());
        Ok(self.games.entry(game_id).or_insert(hosted))
    }

    /// Seats a player in a game and returns the snapshot they start from.
    pub fn join(&mut self, game_id: &str, player: &str) -> Result<Snapshot, JoinError> {
        let now = self.clock.now();
        let hosted = self
            .games
            .get_mut(game_id)
            .ok_or_else(|| JoinError::UnknownGame(game_id.to_string()))?;
        let colour = hosted.seat(player, now);
        hosted.last_activity = now;
        log::info!(
            "{player} joined {game_id} as {}",
            colour.map_or("an observer".to_string(), |colour| colour.to_string())
        );
        Ok(hosted.snapshot(now, colour))
    }

    /// Snapshot of a game for a player, without seating them.
    pub fn sync(&self, game_id: &str, player: &str) -> Result<Snapshot, JoinError> {
        let hosted = self
            .games
            .get(game_id)
            .ok_or_else(|| JoinError::UnknownGame(game_id.to_string()))?;
        Ok(hosted.snapshot(self.clock.now(), hosted.seat_of(player)))
    }

    /// Plays a move on behalf of a player, at the current game clock time.
    pub fn request_move(
        &mut self,
        game_id: &str,
        player: &str,
        request: &MoveRequest,
    ) -> Result<ConfirmedMove, MoveRejection> {
        let now = self.clock.now();
        let hosted = self
            .games
            .get_mut(game_id)
            .ok_or_else(|| MoveRejection::UnknownGame(game_id.to_string()))?;
        if hosted.status != GameStatus::Playing {
            return Err(MoveRejection::NotPlaying(hosted.status));
        }
        let piece = hosted
            .game
            .position()
            .piece_on(request.from)
            .ok_or(IllegalMoveError::EmptySquare(request.from))?;
        if hosted.seat_of(player) != Some(piece.colour) {
            return Err(MoveRejection::NotYourPiece(request.from));
        }

        let filter = MoveFilter::all()
            .with_cooldown(hosted.config.cooldown)
            .at(hosted.game_time(now));
        let mv = hosted.game.play(request, filter)?;
        hosted.last_activity = now;
        let state = hosted.game.state();
        if state.is_over() {
            hosted.status = GameStatus::Finished(state);
            log::info!("game {game_id} is over: {state}");
        }
        Ok(ConfirmedMove::from(&mv))
    }

    /// Drops games idle for longer than their configuration allows,
    /// returning their identifiers.
    pub fn expire_idle(&mut self) -> Vec<GameId> {
        let now = self.clock.now();
        let expired: Vec<GameId> = self
            .games
            .iter()
            .filter(|(_, hosted)| now.saturating_sub(hosted.last_activity) > hosted.config.max_idle)
            .map(|(game_id, _)| game_id.clone())
            .collect();
        for game_id in &expired {
            log::info!("dropping idle game {game_id}");
            self.games.remove(game_id);
        }
        expired
    }

    /// Snapshots for the seated players other than `except`, once the game
    /// clock has started.
    fn start_snapshots(&self, game_id: &str, except: &str) -> Vec<Outbound> {
        let Some(hosted) = self.games.get(game_id) else {
            return vec![];
        };
        if hosted.status != GameStatus::Playing {
            return vec![];
        }
        let now = self.clock.now();
        Colour::iter()
            .filter_map(|colour| {
                let player = hosted.player(colour).filter(|&player| player != except)?;
                Some(Outbound {
                    game_id: game_id.to_string(),
                    to: Some(player.to_string()),
                    message: ServerMessage::Snapshot(hosted.snapshot(now, Some(colour))),
                })
            })
            .collect()
    }

    /// Handles a message from a player, returning the messages to send back.
    pub fn handle(&mut self, player: &str, message: ClientMessage) -> Vec<Outbound> {
        let game_id = message.game_id().to_string();
        let reply = |message| Outbound {
            game_id: game_id.clone(),
            to: Some(player.to_string()),
            message,
        };
        match message {
            ClientMessage::Create { nfen, cooldown, .. } => {
                let config = match cooldown {
                    Some(cooldown) => self.default_config.with_cooldown(cooldown),
                    None => self.default_config,
                };
                let created = match nfen {
                    Some(nfen) => self.create_game_from_nfen(game_id.clone(), &nfen, config),
                    None => self.create_game(game_id.clone(), config),
                };
                match created {
                    Ok(_) => vec![reply(ServerMessage::Created {
                        game_id: game_id.clone(),
                    })],
                    Err(e) => vec![reply(ServerMessage::CreateFailed {
                        reason: e.to_string(),
                    })],
                }
            }
            ClientMessage::Join { .. } => {
                let was_waiting =
                    self.game(&game_id).map(HostedGame::status) == Some(GameStatus::Waiting);
                match self.join(&game_id, player) {
                    Ok(snapshot) => {
                        let mut outbound = vec![reply(ServerMessage::Snapshot(snapshot))];
                        if was_waiting {
                            outbound.extend(self.start_snapshots(&game_id, player));
                        }
                        outbound
                    }
                    Err(e) => vec![reply(ServerMessage::JoinFailed {
                        reason: e.to_string(),
                    })],
                }
            }
            ClientMessage::SyncRequest { .. } => match self.sync(&game_id, player) {
                Ok(snapshot) => vec![reply(ServerMessage::Snapshot(snapshot))],
                Err(e) => vec![reply(ServerMessage::JoinFailed {
                    reason: e.to_string(),
                })],
            },
            ClientMessage::MoveRequest { request, .. } => {
                match self.request_move(&game_id, player, &request) {
                    Ok(confirmed) => vec![Outbound {
                        game_id: game_id.clone(),
                        to: None,
                        message: ServerMessage::MoveConfirm { confirmed },
                    }],
                    Err(e) => {
                        log::warn!("rejected {request} from {player} in {game_id}: {e}");
                        vec![reply(ServerMessage::MoveRejected {
                            reason: e.to_string(),
                        })]
                    }
                }
            }
        }
    }
}
