//! Engine configuration
//!
//! Settings that change how a keymap is applied. Every field has a default,
//! so a partial JSON document (or none at all) is a valid configuration.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use crate::Result;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::Transformer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Drop containers created for a nested keymap that received no writes
    pub prune_empty_containers: bool,

    /// Maximum structural nesting depth, unlimited when unset
    pub max_depth: Option<usize>,

    /// Most nulls a single destination write may pad a sequence with
    pub max_sequence_padding: usize,
}

/// Default bound on null padding per destination write
pub const DEFAULT_MAX_SEQUENCE_PADDING: usize = 10_000;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prune_empty_containers: true,
            max_depth: None,
            max_sequence_padding: DEFAULT_MAX_SEQUENCE_PADDING,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_prune_empty_containers(mut self, prune: bool) -> Self {
        self.prune_empty_containers = prune;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_sequence_padding(mut self, padding: usize) -> Self {
        self.max_sequence_padding = padding;
        self
    }
}
