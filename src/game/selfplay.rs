//! # Random self-play
//! Plays random moves on a game while a simulated clock ticks forward, which
//! exercises cooldowns the way real players would.

use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

use super::{action::Move, movegen::MoveFilter, piece::Timestamp, play::Game};

/// Builder pattern to configure a random self-play run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SelfPlayConfig {
    pub max_moves: usize,
    pub cooldown: Timestamp,
    pub time_step: Timestamp,
    pub seed: Option<u64>,
}
impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            max_moves: 100,
            cooldown: 0,
            time_step: 100,
            seed: None,
        }
    }
}
impl SelfPlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops after this many moves, even if no king has been captured.
    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = max_moves;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Timestamp) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Milliseconds the clock advances between two attempts to move.
    pub fn with_time_step(mut self, time_step: Timestamp) -> Self {
        self.time_step = time_step.max(1);
        self
    }

    /// Makes the run reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Plays random moves until the game is over or the move limit is reached,
    /// returning the moves played.
    pub fn go(&self, game: &mut Game) -> Vec<Move> {
        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let step = self.time_step.max(1);
        let mut now = game.history().map(|mv| mv.time).max().unwrap_or(0);
        let mut played = vec![];

        while played.len() < self.max_moves && !game.state().is_over() {
            let moves = game.moves(MoveFilter::all().with_cooldown(self.cooldown).at(now));
            let Some(mv) = moves.choose(&mut rng).cloned() else {
                if game.moves(MoveFilter::all()).is_empty() {
                    log::info!("no piece can ever move, stopping self-play");
                    break;
                }
                now += step;
                continue;
            };
            match game.apply_move(mv, now) {
                Ok(mv) => played.push(mv),
                Err(e) => {
                    log::error!("generated move could not be applied: {e}");
                    break;
                }
            }
            now += step;
        }
        log::info!(
            "self-play stopped after {} moves at {now}ms: {}",
            played.len(),
            game.state()
        );
        played
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::{action::MoveRequest, fen::STARTING_NFEN};

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = SelfPlayConfig::new()
            .with_max_moves(60)
            .with_cooldown(1000)
            .with_time_step(250)
            .with_seed(7);
        let (mut first, mut second) = (Game::new(), Game::new());
        assert_eq!(config.go(&mut first), config.go(&mut second));
        assert_eq!(first, second);
    }

    #[test]
    fn random_moves_respect_cooldowns() {
        let config = SelfPlayConfig::new()
            .with_max_moves(80)
            .with_cooldown(1000)
            .with_time_step(150)
            .with_seed(42);
        let mut game = Game::new();
        let played = config.go(&mut game);
        assert!(!played.is_empty() && played.len() <= 80);
        assert!(played.windows(2).all(|pair| pair[0].time <= pair[1].time));

        let mut replay = Game::from_nfen(STARTING_NFEN).unwrap();
        for mv in &played {
            let filter = MoveFilter::all().with_cooldown(1000).at(mv.time);
            let request = MoveRequest {
                promotion: mv.promotion,
                ..MoveRequest::new(mv.from, mv.to)
            };
            assert_eq!(replay.play(&request, filter).as_ref(), Ok(mv));
        }
        assert!(replay.position().is_consistent());
    }

    #[test]
    fn stops_when_the_game_is_over() {
        let mut game = Game::from_nfen("8/8/8/8/8/8/8/Kk6 - 1").unwrap();
        assert!(game.state().is_over());
        assert!(SelfPlayConfig::new().with_seed(3).go(&mut game).is_empty());

        let mut game = Game::from_nfen("8/8/8/8/8/8/8/KQ4qk - 1").unwrap();
        let played = SelfPlayConfig::new()
            .with_max_moves(10_000)
            .with_seed(3)
            .go(&mut game);
        assert!(game.state().is_over());
        assert!(played.last().is_some_and(|mv| mv.captured.is_some()));
    }

    #[test]
    fn bare_board_stops_immediately() {
        let mut game = Game::from_nfen("8/8/8/8/8/8/8/8 - 1").unwrap();
        assert!(SelfPlayConfig::new().go(&mut game).is_empty());
    }
}
