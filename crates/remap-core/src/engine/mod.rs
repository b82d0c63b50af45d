//! Traversal engine
//!
//! Walks a compiled keymap and an input document in lockstep. Mapping levels
//! run the matcher over the input keys and either write leaf values or recurse
//! into nested keymaps; sequence levels apply the single element rule to each
//! element while tracking the iteration index for `%` wildcards.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

pub mod context;
pub mod resolver;

pub use context::{Slot, TraversalContext};
pub use resolver::{resolve, resolve_element, substitute_wildcards, Resolved};

use crate::keymap::functions::type_name;
use crate::keymap::{field_path, index_path, FunctionTable, Keymap, KeymapEntry, KeymapNode, Rule, ROOT_PATH};
use crate::{EngineConfig, Error, Result};
use serde_json::{Map, Value};

/// A compiled keymap bundled with its functions and configuration
///
/// Compile once, then [`apply`](Transformer::apply) to any number of inputs.
/// Each call gets its own traversal state, so a transformer can be shared.
///
/// ```
/// use remap_core::{FunctionTable, Transformer};
/// use serde_json::json;
///
/// let functions = FunctionTable::new().with("upper", |args| {
///     let key = args[0].as_str().unwrap_or_default().to_uppercase();
///     Ok(json!({ "key": key }))
/// });
/// let transformer = Transformer::new(&json!({"name": "upper()"}))
///     .unwrap()
///     .with_functions(functions);
///
/// let output = transformer.apply(&json!({"name": "Ada"})).unwrap();
/// assert_eq!(output, json!({"NAME": "Ada"}));
/// ```
#[derive(Debug, Clone)]
pub struct Transformer {
    keymap: Keymap,
    functions: FunctionTable,
    config: EngineConfig,
}

impl Transformer {
    /// Compile a keymap with an empty function table and default configuration
    pub fn new(keymap: &Value) -> Result<Self> {
        Ok(Self::from_keymap(Keymap::compile(keymap)?))
    }

    pub fn from_keymap(keymap: Keymap) -> Self {
        Self {
            keymap,
            functions: FunctionTable::new(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_functions(mut self, functions: FunctionTable) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Remap `input` into a new output tree
    pub fn apply(&self, input: &Value) -> Result<Value> {
        let root = self.keymap.root();
        if !root.accepts(input) {
            return Err(Error::shape(
                format!(
                    "keymap is a {} but input is a {}",
                    root.kind(),
                    type_name(input)
                ),
                ROOT_PATH,
            ));
        }

        log::debug!("applying {} keymap", root.kind());

        let mut context = TraversalContext::new(empty_like(input), self.config.clone());
        let traversal = Traversal {
            functions: &self.functions,
        };
        traversal.visit(root, input, &mut context, ROOT_PATH)?;

        log::debug!("transform finished");
        Ok(context.finish())
    }
}

/// The recursive walk; holds what stays fixed for one transform
struct Traversal<'f> {
    functions: &'f FunctionTable,
}

impl Traversal<'_> {
    fn visit(&self, node: &KeymapNode, input: &Value, ctx: &mut TraversalContext, path: &str) -> Result<()> {
        match (node, input) {
            (KeymapNode::Mapping(entries), Value::Object(fields)) => {
                self.visit_mapping(entries, fields, ctx, path)
            }
            (KeymapNode::Sequence(rule), Value::Array(items)) => {
                self.visit_sequence(rule, items, ctx, path)
            }
            _ => Err(Error::shape(
                format!(
                    "keymap {} cannot be applied to {}",
                    node.kind(),
                    type_name(input)
                ),
                path,
            )),
        }
    }

    fn visit_mapping(
        &self,
        entries: &[KeymapEntry],
        fields: &Map<String, Value>,
        ctx: &mut TraversalContext,
        path: &str,
    ) -> Result<()> {
        let input_keys: Vec<&String> = fields.keys().collect();

        let mut matches = Vec::new();
        for entry in entries {
            let found = entry
                .spec
                .find_matches(input_keys.iter().copied(), self.functions, path)?;
            matches.extend(found.into_iter().map(|matched| (entry, matched)));
        }

        for (entry, matched) in &matches {
            let key = matched.key();
            let value_path = field_path(path, key);
            let value = fields.get(key).ok_or_else(|| {
                Error::shape(format!("matched key `{}` is not in the input", key), &value_path)
            })?;

            match &entry.rule {
                Rule::Destination(destination) => {
                    let resolved = resolve(
                        destination,
                        matched,
                        value,
                        ctx.counters(),
                        self.functions,
                        &value_path,
                    )?;
                    ctx.write(&resolved.path, resolved.value, &value_path)?;
                }
                Rule::Nested(node) => {
                    if ctx.is_occupied(key) {
                        return Err(Error::Collision {
                            destination: key.to_string(),
                            path: value_path,
                        });
                    }
                    self.descend(node, value, Slot::Field(key.to_string()), ctx, &value_path)?;
                }
            }
        }

        Ok(())
    }

    fn visit_sequence(
        &self,
        rule: &Rule,
        items: &[Value],
        ctx: &mut TraversalContext,
        path: &str,
    ) -> Result<()> {
        ctx.with_sequence(|ctx| {
            for (index, element) in items.iter().enumerate() {
                ctx.set_index(index);
                let element_path = index_path(path, index);

                match rule {
                    Rule::Destination(destination) => {
                        let resolved = resolve_element(
                            destination,
                            index,
                            element,
                            ctx.counters(),
                            self.functions,
                            &element_path,
                        )?;
                        ctx.write(&resolved.path, resolved.value, &element_path)?;
                    }
                    Rule::Nested(node) => {
                        self.descend(node, element, Slot::Index(index), ctx, &element_path)?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Recurse into `value` with a fresh output container attached at `slot`
    fn descend(
        &self,
        node: &KeymapNode,
        value: &Value,
        slot: Slot,
        ctx: &mut TraversalContext,
        path: &str,
    ) -> Result<()> {
        if !node.accepts(value) {
            return Err(Error::shape(
                format!(
                    "nested {} keymap cannot be applied to {}",
                    node.kind(),
                    type_name(value)
                ),
                path,
            ));
        }
        ctx.with_frame(empty_like(value), slot, path, |ctx| {
            self.visit(node, value, ctx, path)
        })
    }
}

/// An empty container of the same kind as `value`
fn empty_like(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}
