//! Keymap language: destination paths, match keys, patterns and functions
//!
//! This module owns everything that interprets the strings found inside a
//! keymap. The traversal in [`crate::engine`] drives it.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

pub mod compile;
pub mod functions;
pub mod matcher;
pub mod path;
pub mod pattern;

pub use compile::{Destination, Keymap, KeymapEntry, KeymapNode, Rule};
pub use functions::{FunctionTable, KeyFunction, MapperOutcome, PredicateOutcome};
pub use matcher::{KeyMatch, MatchSpec};
pub use path::{parse_key, KeyToken};
pub use pattern::KeyPattern;

/// Location of the document root in error messages
pub(crate) const ROOT_PATH: &str = "$";

/// `$.a` style location of a mapping field
pub(crate) fn field_path(parent: &str, key: &str) -> String {
    format!("{}.{}", parent, key)
}

/// `$.a[2]` style location of a sequence element
pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}
