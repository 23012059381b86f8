//! Helper functions for parsing move logs

use super::*;

/// Returns the rest of the input after walking whitespace and comments.
///
/// An unterminated comment runs to the end of the input.
pub fn walk_whitespace_and_comments(mut src: &str) -> &str {
    loop {
        match src.chars().next() {
            Some('{') => {
                // Continue until we reach }
                src = src.split_once('}').map_or("", |(_, left)| left)
            }
            Some(';') => {
                // Continue until end of line or EOF.
                src = src.split_once('\n').map_or("", |(_, left)| left)
            }
            Some(c) if c.is_whitespace() => {
                src = src.trim_start();
            }
            _ => return src,
        }
    }
}

/// Game result tokens that can end a move log.
pub const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Parses a game result token.
pub fn parse_game_result(src: &str) -> Result<(&'static str, &str), ()> {
    RESULT_TOKENS
        .into_iter()
        .find_map(|token| Some((token, src.strip_prefix(token)?)))
        .ok_or(())
}

/// Parses valid header tags.
pub fn parse_tag(src: &str) -> Result<(String, &str), ()> {
    let mut result = String::new();
    let mut chars = src.chars();

    match chars.next() {
        Some(c) if c.is_alphanumeric() => result.push(c),
        _ => return Err(()),
    }

    for c in chars {
        if c.is_alphanumeric() || c == '_' {
            result.push(c)
        } else if c.is_whitespace() {
            break;
        } else {
            return Err(());
        }
    }

    let left = &src[result.len()..];
    Ok((result, left))
}

/// Parses header tag pairs in the order they appear, separated by zero or more
/// whitespaces.
pub fn parse_tag_pairs(mut s: &str) -> Result<(Vec<PgnTagPair>, &str), PgnTagPairParseError> {
    s = walk_whitespace_and_comments(s);
    let mut result = vec![];
    while s.starts_with('[') {
        let (tag_pair, left) = PgnTagPair::partial_from_str(s)?;
        s = walk_whitespace_and_comments(left);
        result.push(tag_pair);
    }
    Ok((result, s))
}

/// Skips a variation starting with `(`, along with any variation nested in it.
pub fn skip_variation(src: &str) -> Result<&str, ()> {
    let mut depth = 0;
    let mut s = src;
    while let Some(c) = s.chars().next() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&s[1..]);
                }
            }
            '{' | ';' => {
                s = walk_whitespace_and_comments(s);
                continue;
            }
            _ => (),
        }
        s = &s[c.len_utf8()..];
    }
    Err(())
}

/// Skips a numeric annotation glyph like `$14`.
pub fn skip_nag(src: &str) -> Option<&str> {
    let (_, left) = parse_int(src.strip_prefix('$')?).ok()?;
    Some(left)
}

/// Splits the next move token from the input.
pub fn take_token(src: &str) -> (&str, &str) {
    let end = src
        .find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '{' | ';'))
        .unwrap_or(src.len());
    src.split_at(end)
}

/// Move text without promotion signs, check markers or annotation suffixes.
pub fn strip_decorations(san: &str) -> String {
    san.trim_end_matches(['?', '!'])
        .trim_end_matches(['+', '#'])
        .replacen('=', "", 1)
}

/// Loosely written move, such as `Pe2-e4`, `Rc1c4` or `Qf3xf7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SloppyMove {
    pub piece: Option<PieceKind>,
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}
impl SloppyMove {
    /// Checks if a generated move fits this description.
    pub fn fits(&self, mv: &Move) -> bool {
        self.piece.map_or(true, |piece| piece == mv.piece)
            && self.from == mv.from
            && self.to == mv.to
            && self.promotion.map_or(true, |kind| Some(kind) == mv.promotion)
    }

    fn partial_from_squares(piece: Option<PieceKind>, s: &str) -> Result<(Self, &str), ()> {
        let (from, s) = Square::partial_from_str(s).map_err(|_| ())?;
        let s = s.strip_prefix('x').unwrap_or(s);
        let s = s.strip_prefix('-').unwrap_or(s);
        let (to, s) = Square::partial_from_str(s).map_err(|_| ())?;
        let promotion = s
            .chars()
            .next()
            .and_then(PieceKind::from_symbol)
            .filter(|kind| PieceKind::PROMOTIONS.contains(kind));
        let s = if promotion.is_some() { &s[1..] } else { s };
        Ok((
            Self {
                piece,
                from,
                to,
                promotion,
            },
            s,
        ))
    }
}
impl PartialFromStr for SloppyMove {
    type Err = ();

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let piece = s.chars().next().and_then(PieceKind::from_symbol);
        match piece {
            Some(kind) => Self::partial_from_squares(Some(kind), &s[1..])
                .or_else(|_| Self::partial_from_squares(None, s)),
            None => Self::partial_from_squares(None, s),
        }
    }
}
