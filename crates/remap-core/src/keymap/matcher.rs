//! Matching keymap keys against input keys
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use super::functions::{function_reference, FunctionTable};
use super::pattern::KeyPattern;
use crate::Result;
use serde_json::Value;
use std::fmt;

/// A compiled keymap key
#[derive(Debug, Clone)]
pub enum MatchSpec {
    /// Exact key equality
    Literal(String),
    /// `/source/flags` regular expression
    Pattern(KeyPattern),
    /// `name()` predicate function
    Predicate(String),
}

/// One correspondence between a keymap key and an input key
#[derive(Debug, Clone)]
pub enum KeyMatch<'a> {
    Literal {
        key: &'a str,
    },
    /// Carries the pattern so the destination can reference capture groups
    Pattern {
        key: &'a str,
        pattern: &'a KeyPattern,
    },
    /// Carries the extra arguments returned by the predicate
    Predicate {
        key: &'a str,
        args: Vec<Value>,
    },
}

impl<'a> KeyMatch<'a> {
    /// The matched input key
    pub fn key(&self) -> &'a str {
        match self {
            KeyMatch::Literal { key } => *key,
            KeyMatch::Pattern { key, .. } => *key,
            KeyMatch::Predicate { key, .. } => *key,
        }
    }

    /// Extra mapper arguments carried by the match
    pub fn args(&self) -> &[Value] {
        match self {
            KeyMatch::Predicate { args, .. } => args,
            _ => &[],
        }
    }
}

impl MatchSpec {
    /// Classify and compile a keymap key
    pub fn parse(key: &str, path: &str) -> Result<Self> {
        if KeyPattern::is_pattern(key) {
            return Ok(MatchSpec::Pattern(KeyPattern::parse(key, path)?));
        }
        if let Some(name) = function_reference(key) {
            return Ok(MatchSpec::Predicate(name.to_string()));
        }
        Ok(MatchSpec::Literal(key.to_string()))
    }

    /// Find every candidate input key this match key accepts, in candidate order
    pub fn find_matches<'a, I>(
        &'a self,
        candidates: I,
        functions: &FunctionTable,
        path: &str,
    ) -> Result<Vec<KeyMatch<'a>>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut matches = Vec::new();

        match self {
            MatchSpec::Literal(literal) => {
                if candidates.into_iter().any(|candidate| candidate == literal) {
                    matches.push(KeyMatch::Literal { key: literal });
                }
            }
            MatchSpec::Pattern(pattern) => {
                matches.extend(
                    candidates
                        .into_iter()
                        .filter(|candidate| pattern.is_match(candidate))
                        .map(|candidate| KeyMatch::Pattern {
                            key: candidate.as_str(),
                            pattern,
                        }),
                );
            }
            MatchSpec::Predicate(name) => {
                // Resolve up front so a missing function fails even with no candidates
                functions.get(name, path)?;
                for candidate in candidates {
                    let outcome = functions.call_predicate(name, candidate, path)?;
                    if outcome.matched {
                        matches.push(KeyMatch::Predicate {
                            key: candidate.as_str(),
                            args: outcome.args,
                        });
                    }
                }
            }
        }

        log::trace!("{} matched {} input key(s) at {}", self, matches.len(), path);
        Ok(matches)
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchSpec::Literal(key) => write!(f, "{}", key),
            MatchSpec::Pattern(pattern) => write!(f, "{}", pattern),
            MatchSpec::Predicate(name) => write!(f, "{}()", name),
        }
    }
}
