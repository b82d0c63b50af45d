//! Remap Core - declarative tree-remapping engine
//!
//! This crate remaps a JSON-like input document into a new output tree
//! according to a *keymap*: a tree shaped like the input whose keys say which
//! input keys to pick up and whose values say where they go.
//!
//! # Main Components
//!
//! - **Keymap language**: destination paths, literal / pattern / function match
//!   keys and the named function table ([`keymap`])
//! - **Traversal engine**: the recursive walk that builds the output ([`engine`])
//! - **Error Handling**: one error type using `thiserror` and `anyhow` ([`error`])
//! - **Configuration**: optional engine settings ([`config`])
//!
//! # Keymap syntax
//!
//! | Token | Where | Meaning |
//! |---|---|---|
//! | `literal` | match key or destination | exact key / field name |
//! | `/pattern/flags` | match key | regular expression match |
//! | `name()` | match key | predicate function |
//! | `name()` | destination | mapper function |
//! | `$1`, `$&`, ... | destination paired with a pattern | capture references |
//! | `%`, `%N` | destination | innermost / depth-N sequence index |
//! | `..` | destination | go up one output level |
//! | `0`, `12`, ... | destination segment | sequence index |
//!
//! # Example
//!
//! ```
//! use remap_core::{transform, FunctionTable};
//! use serde_json::json;
//!
//! # fn example() -> remap_core::Result<()> {
//! let keymap = json!({
//!     "user": {
//!         "first_name": "..name.first",
//!         "/^(\\w+)_count$/": "..stats.$1",
//!     },
//!     "tags": ["..labels.%"],
//! });
//! let input = json!({
//!     "user": {"first_name": "Ada", "login_count": 3},
//!     "tags": ["x", "y"],
//! });
//!
//! let output = transform(&keymap, &input, &FunctionTable::new())?;
//! assert_eq!(output, json!({
//!     "name": {"first": "Ada"},
//!     "stats": {"login": 3},
//!     "labels": ["x", "y"],
//! }));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod engine;
pub mod error;
pub mod keymap;

pub use config::EngineConfig;
pub use engine::Transformer;
pub use error::{Error, Result};
pub use keymap::{
    parse_key, Destination, FunctionTable, KeyFunction, KeyMatch, KeyPattern, KeyToken, Keymap,
    MatchSpec,
};

use serde_json::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Remap `input` according to `keymap`
///
/// This is the one-shot form of [`Transformer`]: the keymap is compiled,
/// applied once with default configuration, and discarded.
///
/// # Errors
///
/// Returns an error if:
/// - the keymap is malformed or references a function missing from `functions`
/// - the keymap and input disagree on the kind of a node
/// - a destination climbs above the output root
/// - two values are written to the same destination
/// - a user function fails or returns a value of the wrong shape
pub fn transform(keymap: &Value, input: &Value, functions: &FunctionTable) -> Result<Value> {
    Transformer::new(keymap)?
        .with_functions(functions.clone())
        .apply(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_transform_single_key() {
        let output = transform(&json!({"a": "b"}), &json!({"a": 1}), &FunctionTable::new()).unwrap();
        assert_eq!(output, json!({"b": 1}));
    }

    #[test]
    fn test_transform_requires_containers() {
        let err = transform(&json!("a"), &json!({"a": 1}), &FunctionTable::new()).unwrap_err();
        assert_eq!(err.kind(), "shape");
        let err = transform(&json!({"a": "b"}), &json!(null), &FunctionTable::new()).unwrap_err();
        assert_eq!(err.kind(), "shape");
    }
}
