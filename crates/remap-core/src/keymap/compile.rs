//! Compiled keymaps
//!
//! A keymap arrives as a JSON tree. Compiling it once validates its structure,
//! classifies every match key and compiles every pattern, so the traversal only
//! has to deal with well-formed rules.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use super::functions::function_reference;
use super::matcher::MatchSpec;
use super::{field_path, ROOT_PATH};
use crate::{Error, Result};
use serde_json::Value;

/// Where a matched value goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Destination path template, e.g. `..a.%`
    Path(String),
    /// `name()` value mapper computing the path and value
    Mapper(String),
}

impl Destination {
    pub fn parse(text: &str) -> Self {
        match function_reference(text) {
            Some(name) => Destination::Mapper(name.to_string()),
            None => Destination::Path(text.to_string()),
        }
    }
}

/// What to do with a matched input value
#[derive(Debug, Clone)]
pub enum Rule {
    /// Leaf correspondence: write the value somewhere
    Destination(Destination),
    /// Structural correspondence: recurse with a nested keymap
    Nested(KeymapNode),
}

/// One `match key -> rule` entry of a mapping node
#[derive(Debug, Clone)]
pub struct KeymapEntry {
    pub spec: MatchSpec,
    pub rule: Rule,
}

/// A keymap node mirrors one container of the input
#[derive(Debug, Clone)]
pub enum KeymapNode {
    /// Entries in keymap order
    Mapping(Vec<KeymapEntry>),
    /// The single element rule applied to every input element
    Sequence(Box<Rule>),
}

impl KeymapNode {
    /// Whether `input` is the kind of container this node expects
    pub fn accepts(&self, input: &Value) -> bool {
        matches!(
            (self, input),
            (KeymapNode::Mapping(_), Value::Object(_)) | (KeymapNode::Sequence(_), Value::Array(_))
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            KeymapNode::Mapping(_) => "mapping",
            KeymapNode::Sequence(_) => "sequence",
        }
    }
}

/// A validated keymap, ready to be applied to any number of inputs
///
/// ```
/// use remap_core::Keymap;
/// use serde_json::json;
///
/// let keymap = Keymap::compile(&json!({"a": "b", "list": ["..items.%"]})).unwrap();
/// assert_eq!(keymap.root().kind(), "mapping");
///
/// assert!(Keymap::compile(&json!(["a", "b"])).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Keymap {
    root: KeymapNode,
}

impl Keymap {
    /// Validate and compile a keymap tree
    pub fn compile(keymap: &Value) -> Result<Self> {
        match keymap {
            Value::Object(_) | Value::Array(_) => Ok(Self {
                root: compile_node(keymap, ROOT_PATH)?,
            }),
            _ => Err(Error::shape("keymap must be a mapping or a sequence", ROOT_PATH)),
        }
    }

    pub fn root(&self) -> &KeymapNode {
        &self.root
    }
}

fn compile_node(keymap: &Value, path: &str) -> Result<KeymapNode> {
    match keymap {
        Value::Object(entries) => {
            let entries = entries
                .iter()
                .map(|(key, rule)| {
                    let entry_path = field_path(path, key);
                    Ok(KeymapEntry {
                        spec: MatchSpec::parse(key, &entry_path)?,
                        rule: compile_rule(rule, &entry_path)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(KeymapNode::Mapping(entries))
        }
        Value::Array(rules) => {
            if rules.len() != 1 {
                return Err(Error::configuration(
                    format!(
                        "sequence keymap must have exactly one element rule, found {}",
                        rules.len()
                    ),
                    path,
                ));
            }
            let element_path = format!("{}[*]", path);
            Ok(KeymapNode::Sequence(Box::new(compile_rule(&rules[0], &element_path)?)))
        }
        other => Err(Error::configuration(
            format!(
                "keymap node must be a mapping or a sequence, found {}",
                super::functions::type_name(other)
            ),
            path,
        )),
    }
}

fn compile_rule(rule: &Value, path: &str) -> Result<Rule> {
    match rule {
        Value::String(destination) => Ok(Rule::Destination(Destination::parse(destination))),
        Value::Object(_) | Value::Array(_) => Ok(Rule::Nested(compile_node(rule, path)?)),
        other => Err(Error::configuration(
            format!(
                "keymap rule must be a destination string or a nested keymap, found {}",
                super::functions::type_name(other)
            ),
            path,
        )),
    }
}
