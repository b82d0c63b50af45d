//! Error types for the remap core library
//!
//! This module defines the error handling system for remap, using thiserror
//! for the error definitions and anyhow for failures raised by user functions.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Main error type for remap operations
///
/// Every variant aborts the whole transform; no partial output is returned.
#[derive(Error, Debug)]
pub enum Error {
    /// The keymap is malformed or references something that does not exist
    #[error("Configuration error at {path}: {message}")]
    Configuration {
        message: String,
        path: String,
    },

    /// Keymap and input disagree on the kind of node at some level
    #[error("Shape error at {path}: {message}")]
    Shape {
        message: String,
        path: String,
    },

    /// A destination path cannot be walked in the output tree
    #[error("Navigation error in `{destination}`: {message}")]
    Navigation {
        message: String,
        destination: String,
    },

    /// A destination already holds a value
    #[error("Collision at `{destination}` (input {path}): destination already holds a value")]
    Collision {
        destination: String,
        path: String,
    },

    /// A user function returned a value of the wrong shape
    #[error("Output contract violated by {function}(): {message}")]
    OutputContract {
        function: String,
        message: String,
    },

    /// A user function failed
    #[error("Function {function}() failed: {source}")]
    Function {
        function: String,
        #[source]
        source: anyhow::Error,
    },

    /// The input is nested deeper than the configured limit
    #[error("Depth limit of {limit} exceeded at {path}")]
    DepthLimit {
        limit: usize,
        path: String,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error for the given input location
    pub fn configuration(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a shape error for the given input location
    pub fn shape(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a navigation error for the given destination path
    pub fn navigation(message: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
            destination: destination.into(),
        }
    }

    /// Create an output contract error for the named function
    pub fn output_contract(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OutputContract {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Short, stable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "configuration",
            Error::Shape { .. } => "shape",
            Error::Navigation { .. } => "navigation",
            Error::Collision { .. } => "collision",
            Error::OutputContract { .. } => "output_contract",
            Error::Function { .. } => "function",
            Error::DepthLimit { .. } => "depth_limit",
            Error::Json { .. } => "json",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Collision {
            destination: "a.b".to_string(),
            path: "$.x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Collision at `a.b` (input $.x): destination already holds a value"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::configuration("missing", "$").kind(), "configuration");
        assert_eq!(Error::shape("mismatch", "$").kind(), "shape");
        assert_eq!(Error::navigation("too high", "..a").kind(), "navigation");
        assert_eq!(Error::output_contract("f", "not an object").kind(), "output_contract");
    }

    #[test]
    fn test_function_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::Function {
            function: "f".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(err.to_string().contains("boom"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.kind(), "json");
    }
}
