//! # Move logs
//! Games are recorded in a PGN-like format where every half-move carries its
//! colour explicitly, since colours do not alternate:
//!
//! ```text
//! [White "alice"]
//! [Black "bob"]
//!
//! 1.We4 2.Be5 3.WNf3 4.WNc3 1-0
//! ```
//!
//! Each token is the move number before the move, a `W` or `B` colour letter
//! and the algebraic notation of the move.

use thiserror::Error;

use crate::{
    game::{
        action::Move,
        colour::Colour,
        fen::NFenError,
        movegen::MoveFilter,
        piece::PieceKind,
        play::Game,
        position::Position,
        square::Square,
    },
    parsing::{parse_int, parse_string, PartialFromStr},
};

mod parse;
use parse::*;

/// Tag pair representation for contextual game information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PgnTagPair {
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum PgnTagPairParseError {
    #[error("Missing opening bracket")]
    MissingOpeningBracket,
    #[error("Invalid tag")]
    InvalidTag,
    #[error("Invalid value")]
    InvalidValue,
    #[error("Missing closing bracket")]
    MissingClosingBracket,
}

impl PartialFromStr for PgnTagPair {
    type Err = PgnTagPairParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        if let Some('[') = s.chars().next() {
            let s = walk_whitespace_and_comments(&s[1..]);
            let (tag, s) = parse_tag(s).map_err(|_| PgnTagPairParseError::InvalidTag)?;
            let s = walk_whitespace_and_comments(s);
            let (value, s) = parse_string(s).map_err(|_| PgnTagPairParseError::InvalidValue)?;
            let s = walk_whitespace_and_comments(s);
            if let Some(']') = s.chars().next() {
                Ok((PgnTagPair { tag, value }, &s[1..]))
            } else {
                Err(PgnTagPairParseError::MissingClosingBracket)
            }
        } else {
            Err(PgnTagPairParseError::MissingOpeningBracket)
        }
    }
}
impl std::fmt::Display for PgnTagPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} \"{}\"]",
            self.tag,
            self.value.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

/// Formatting of a written move log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveLogOptions {
    pub max_width: usize,
    pub newline: String,
}
impl Default for MoveLogOptions {
    fn default() -> Self {
        Self {
            max_width: 0,
            newline: "\n".to_string(),
        }
    }
}
impl MoveLogOptions {
    /// Wraps move tokens at the given number of columns, `0` keeping them on
    /// a single line.
    pub fn with_max_width(mut self, max_width: usize) -> Self {
        self.max_width = max_width;
        self
    }

    /// Line separator, `\n` by default.
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Hash)]
pub enum MoveLogError {
    #[error(transparent)]
    TagPair(#[from] PgnTagPairParseError),
    #[error("SetUp header is set but no FEN header was found")]
    MissingSetUpFen,
    #[error("Invalid starting position: {0}")]
    InvalidSetUp(#[from] NFenError),
    #[error("Unbalanced variation parentheses")]
    UnbalancedVariation,
    #[error("Could not play `{token}` after {applied} moves")]
    UnknownMove { token: String, applied: usize },
}

fn unknown_move(token: &str, applied: usize) -> MoveLogError {
    MoveLogError::UnknownMove {
        token: token.to_string(),
        applied,
    }
}

impl Game {
    /// Writes the move log of this game.
    pub fn move_log(&self, options: &MoveLogOptions) -> String {
        let mut result = String::new();
        let mut has_headers = false;
        for (tag, value) in self.position().headers() {
            let pair = PgnTagPair {
                tag: tag.to_string(),
                value: value.to_string(),
            };
            result.push_str(&pair.to_string());
            result.push_str(&options.newline);
            has_headers = true;
        }
        if has_headers && self.history().next().is_some() {
            result.push_str(&options.newline);
        }

        // Replays the history on a copy, so every SAN is written against the
        // position it was played on.
        let mut replay = self.clone();
        let mut played = vec![];
        while let Some(mv) = replay.undo() {
            played.push(mv);
        }
        let mut tokens = vec![];
        for mv in played.into_iter().rev() {
            let move_number = replay.position().move_number();
            let time = mv.time;
            let Ok(mv) = replay.apply_move(mv, time) else {
                log::warn!("history of the game cannot be replayed, move log is cut short");
                break;
            };
            tokens.push(format!("{move_number}.{}{}", mv.colour.log_letter(), mv.san));
        }
        if let Some(outcome) = self.position().header("Result") {
            tokens.push(outcome.to_string());
        }

        if options.max_width == 0 {
            result.push_str(&tokens.join(" "));
            return result;
        }
        let mut width = 0;
        for (i, token) in tokens.iter().enumerate() {
            if i != 0 {
                if width + token.len() > options.max_width {
                    result.push_str(&options.newline);
                    width = 0;
                } else {
                    result.push(' ');
                    width += 1;
                }
            }
            result.push_str(token);
            width += token.len();
        }
        result
    }

    /// Replaces this game with the one recorded in a move log, returning the
    /// moves played.
    ///
    /// Moves are played at time `0`. With `sloppy`, coordinate moves such as
    /// `Pe2-e4` are accepted along with algebraic notation. On failure, the
    /// moves read before the faulty token stay applied.
    pub fn load_move_log(&mut self, text: &str, sloppy: bool) -> Result<Vec<Move>, MoveLogError> {
        *self = Game::new();
        let (tags, mut s) = parse_tag_pairs(text)?;
        let tag_value = |tag: &str| {
            tags.iter()
                .find(|pair| pair.tag == tag)
                .map(|pair| pair.value.as_str())
        };
        if tag_value("SetUp") == Some("1") {
            let nfen = tag_value("FEN").ok_or(MoveLogError::MissingSetUpFen)?;
            *self = Game::from_position(Position::from_nfen(nfen)?);
        }
        for pair in &tags {
            self.position_mut().set_header(&pair.tag, &pair.value);
        }

        let mut applied = vec![];
        let mut numbered = false;
        loop {
            s = walk_whitespace_and_comments(s);
            if let Ok((outcome, left)) = parse_game_result(s) {
                if !tags.is_empty() && tag_value("Result").is_none() {
                    self.position_mut().set_header("Result", outcome);
                }
                log::debug!("move log ended with {outcome}, ignoring {:?}", left.trim());
                break;
            }
            match s.chars().next() {
                None => break,
                Some(c) if c.is_ascii_digit() => {
                    let (_, left) = parse_int(s).map_err(|_| unknown_move(take_token(s).0, applied.len()))?;
                    s = left;
                    numbered = true;
                }
                Some('.') => s = &s[1..],
                Some('(') => {
                    s = skip_variation(s).map_err(|_| MoveLogError::UnbalancedVariation)?
                }
                Some(')') => return Err(MoveLogError::UnbalancedVariation),
                Some('$') => {
                    s = skip_nag(s).ok_or_else(|| unknown_move(take_token(s).0, applied.len()))?
                }
                Some(_) => {
                    let (token, left) = take_token(s);
                    let mv = self
                        .resolve_logged_move(token, numbered, sloppy)
                        .ok_or_else(|| unknown_move(token, applied.len()))?;
                    let mv = self
                        .apply_move(mv, 0)
                        .map_err(|_| unknown_move(token, applied.len()))?;
                    applied.push(mv);
                    numbered = false;
                    s = left;
                }
            }
        }
        Ok(applied)
    }

    /// Finds the move written by a token. Right after a move number, the
    /// token is first read as a colour letter followed by the move.
    fn resolve_logged_move(&self, token: &str, numbered: bool, sloppy: bool) -> Option<Move> {
        if numbered {
            let mut chars = token.chars();
            if let Some(colour) = chars.next().and_then(Colour::from_log_letter) {
                if let Some(mv) = self.find_logged_move(chars.as_str(), Some(colour), sloppy) {
                    return Some(mv);
                }
            }
        }
        self.find_logged_move(token, None, sloppy)
    }

    fn find_logged_move(&self, text: &str, colour: Option<Colour>, sloppy: bool) -> Option<Move> {
        let clean = strip_decorations(text);
        let moves: Vec<Move> = self
            .moves(MoveFilter::all())
            .into_iter()
            .filter(|mv| colour.map_or(true, |colour| mv.colour == colour))
            .collect();
        if let Some(mv) = moves.iter().find(|mv| strip_decorations(&mv.san) == clean) {
            return Some(mv.clone());
        }
        if !sloppy {
            return None;
        }
        let (loose, _) = SloppyMove::partial_from_str(&clean).ok()?;
        moves.into_iter().find(|mv| loose.fits(mv))
    }
}
