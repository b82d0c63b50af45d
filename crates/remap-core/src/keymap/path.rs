//! Destination key-path parser
//!
//! A destination path is a dot-delimited string such as `a.0.b` or `..a%`.
//! Parsing turns it into a sequence of navigation tokens. A double dot is an
//! elevator: it cancels the descent immediately before it, or ascends one
//! output level when there is nothing left to cancel.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// A single navigation step in a parsed destination path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    /// Descend into (or create) a mapping field
    Key(String),
    /// Descend into (or create) a sequence slot
    ArrayKey(usize),
    /// Ascend one level in the output navigation stack
    Elevator,
}

impl KeyToken {
    /// Whether this token is an elevator
    pub fn is_elevator(&self) -> bool {
        matches!(self, KeyToken::Elevator)
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Key(name) => write!(f, "{}", name),
            KeyToken::ArrayKey(index) => write!(f, "{}", index),
            KeyToken::Elevator => write!(f, ".."),
        }
    }
}

/// Parse a destination path into navigation tokens
///
/// ```
/// use remap_core::{parse_key, KeyToken};
///
/// assert_eq!(parse_key("a.b..c"), vec![
///     KeyToken::Key("a".to_string()),
///     KeyToken::Key("c".to_string()),
/// ]);
/// assert_eq!(parse_key(".."), vec![KeyToken::Elevator]);
/// assert!(parse_key("a..").is_empty());
/// ```
pub fn parse_key(path: &str) -> Vec<KeyToken> {
    let tokens = KeyPathParser::new(path).parse();
    log::trace!("parsed destination `{}` into {:?}", path, tokens);
    tokens
}

/// Scanner over a destination path
struct KeyPathParser<'a> {
    chars: Peekable<Chars<'a>>,
    tokens: Vec<KeyToken>,
}

impl<'a> KeyPathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            tokens: Vec::new(),
        }
    }

    fn parse(mut self) -> Vec<KeyToken> {
        while let Some(ch) = self.chars.next() {
            if ch == '.' {
                // A lone dot is just a separator
                if self.chars.peek() == Some(&'.') {
                    self.chars.next();
                    self.elevate();
                }
            } else {
                let segment = self.parse_segment(ch);
                self.tokens.push(segment);
            }
        }

        self.tokens
    }

    /// Cancel the previous descent, or ascend if there is none to cancel
    fn elevate(&mut self) {
        match self.tokens.last() {
            Some(token) if !token.is_elevator() => {
                self.tokens.pop();
            }
            _ => self.tokens.push(KeyToken::Elevator),
        }
    }

    fn parse_segment(&mut self, first: char) -> KeyToken {
        let mut segment = String::new();
        segment.push(first);

        while let Some(&ch) = self.chars.peek() {
            if ch == '.' {
                break;
            }
            segment.push(ch);
            self.chars.next();
        }

        classify_segment(segment)
    }
}

/// Purely decimal segments address sequence slots; anything else is a field
fn classify_segment(segment: String) -> KeyToken {
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = segment.parse::<usize>() {
            return KeyToken::ArrayKey(index);
        }
    }
    KeyToken::Key(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> KeyToken {
        KeyToken::Key(name.to_string())
    }

    #[test]
    fn test_empty_path() {
        assert_eq!(parse_key(""), Vec::<KeyToken>::new());
    }

    #[test]
    fn test_single_key() {
        assert_eq!(parse_key("a"), vec![key("a")]);
    }

    #[test]
    fn test_array_keys() {
        assert_eq!(parse_key("0"), vec![KeyToken::ArrayKey(0)]);
        assert_eq!(parse_key("0.0"), vec![KeyToken::ArrayKey(0), KeyToken::ArrayKey(0)]);
        assert_eq!(
            parse_key("0.0.0"),
            vec![KeyToken::ArrayKey(0), KeyToken::ArrayKey(0), KeyToken::ArrayKey(0)]
        );
        assert_eq!(parse_key("12"), vec![KeyToken::ArrayKey(12)]);
    }

    #[test]
    fn test_keys_that_look_numeric() {
        assert_eq!(parse_key("0a"), vec![key("0a")]);
        assert_eq!(parse_key("-1"), vec![key("-1")]);
        assert_eq!(parse_key("99999999999999999999999999"), vec![key("99999999999999999999999999")]);
    }

    #[test]
    fn test_mixed_paths() {
        assert_eq!(parse_key("0.a"), vec![KeyToken::ArrayKey(0), key("a")]);
        assert_eq!(parse_key("a.0"), vec![key("a"), KeyToken::ArrayKey(0)]);
        assert_eq!(parse_key("a.0.a"), vec![key("a"), KeyToken::ArrayKey(0), key("a")]);
        assert_eq!(parse_key("a.b.c"), vec![key("a"), key("b"), key("c")]);
    }

    #[test]
    fn test_elevators() {
        assert_eq!(parse_key(".."), vec![KeyToken::Elevator]);
        assert_eq!(parse_key("..a"), vec![KeyToken::Elevator, key("a")]);
        assert_eq!(
            parse_key("....a%"),
            vec![KeyToken::Elevator, KeyToken::Elevator, key("a%")]
        );
    }

    #[test]
    fn test_elevator_annihilation() {
        assert!(parse_key("a..").is_empty());
        assert_eq!(parse_key("a.b..c"), vec![key("a"), key("c")]);
        // Cancelling `a` leaves nothing to cancel for the second marker
        assert_eq!(parse_key("a....b"), vec![KeyToken::Elevator, key("b")]);
    }

    #[test]
    fn test_elevators_only_prefix() {
        for path in ["..a..b", "a.....b", "....x.y..z", "a.b.c......d"] {
            let tokens = parse_key(path);
            let first_non_elevator = tokens.iter().position(|t| !t.is_elevator());
            if let Some(start) = first_non_elevator {
                assert!(tokens[start..].iter().all(|t| !t.is_elevator()), "{}", path);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(key("a").to_string(), "a");
        assert_eq!(KeyToken::ArrayKey(3).to_string(), "3");
        assert_eq!(KeyToken::Elevator.to_string(), "..");
    }
}
