//! # Parsing
//! Positions, moves and move logs are parsable from raw strings using the
//! standard Rust [`FromStr`](std::str::FromStr) trait.
//!
//! On top of that, types that appear inside larger inputs implement the
//! [`PartialFromStr`] trait, a small *parser combinator* interface.
//!
//! Unlike [`FromStr`], the `Ok` variant returned by [`PartialFromStr`] contains two
//! values:
//! - The parsed value
//! - A suffix of the input that was not part of the parsed value.
//!
//! A string like "d4rest" would return `Ok((Square::D4, "rest"))` when parsed,
//! so "d4d5h2" can be parsed into three squares by successive calls to
//! `partial_from_str`.

pub trait PartialFromStr: Sized {
    type Err;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err>;
}

/// Parses a string value with escaped characters.
pub(crate) fn parse_string(src: &str) -> Result<(String, &str), ()> {
    let mut result = String::new();
    let mut chars = src.char_indices();

    match chars.next() {
        Some((_, '"')) => (),
        _ => return Err(()),
    }

    let mut escaped = false;
    for (index, c) in chars {
        match c {
            '"' if !escaped => return Ok((result, &src[index + 1..])),
            '\\' if !escaped => escaped = true,
            '\t' | '\n' => return Err(()),
            _ => {
                result.push(c);
                escaped = false
            }
        }
    }

    Err(())
}

/// Parses a u32 value.
pub(crate) fn parse_int(src: &str) -> Result<(u32, &str), ()> {
    let parsed = src.bytes().take_while(u8::is_ascii_digit).count();
    if parsed == 0 {
        return Err(());
    }
    let value = src[..parsed].parse().map_err(|_| ())?;
    Ok((value, &src[parsed..]))
}
