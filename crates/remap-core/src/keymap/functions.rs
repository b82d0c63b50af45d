//! Named user functions referenced from keymaps with `name()` syntax
//!
//! The same callable can serve as a predicate (in a match key) or as a value
//! mapper (in a destination). Callables receive positional JSON arguments and
//! return a JSON value whose shape is checked against the role's contract.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A callable registered in a [`FunctionTable`]
pub type KeyFunction = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Result of calling a function as a predicate
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateOutcome {
    pub matched: bool,
    /// Extra positional arguments forwarded to the mapper
    pub args: Vec<Value>,
}

/// Result of calling a function as a value mapper
#[derive(Debug, Clone, PartialEq)]
pub struct MapperOutcome {
    /// Destination path template
    pub key: String,
    /// Replacement value, if the function supplied a non-null one
    pub value: Option<Value>,
}

/// Lookup table of named functions available to a keymap
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, KeyFunction>,
}

impl FunctionTable {
    /// Create an empty function table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Builder-style variant of [`FunctionTable::register`]
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register(name, function);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Look up a function, failing with a configuration error if it is missing
    pub fn get(&self, name: &str, path: &str) -> Result<&KeyFunction> {
        self.functions.get(name).ok_or_else(|| {
            Error::configuration(
                format!("function `{}` could not be found in the function table", name),
                path,
            )
        })
    }

    /// Call `name` as a predicate on a candidate input key
    pub fn call_predicate(&self, name: &str, key: &str, path: &str) -> Result<PredicateOutcome> {
        let function = self.get(name, path)?;
        let output = invoke(name, function, &[Value::String(key.to_string())])?;

        match output {
            Value::Bool(matched) => Ok(PredicateOutcome {
                matched,
                args: Vec::new(),
            }),
            Value::Array(mut items) => {
                if items.is_empty() {
                    return Err(Error::output_contract(
                        name,
                        "predicate returned an empty array",
                    ));
                }
                let extra = if items.len() > 1 {
                    items.swap_remove(1)
                } else {
                    Value::Null
                };
                let args = match extra {
                    Value::Null => Vec::new(),
                    Value::Array(args) => args,
                    other => {
                        return Err(Error::output_contract(
                            name,
                            format!("predicate extra arguments must be an array, got {}", type_name(&other)),
                        ))
                    }
                };
                Ok(PredicateOutcome {
                    matched: is_truthy(&items[0]),
                    args,
                })
            }
            other => Err(Error::output_contract(
                name,
                format!("predicate must return a bool or an array, got {}", type_name(&other)),
            )),
        }
    }

    /// Call `name` as a value mapper on a matched key/value pair
    pub fn call_mapper(
        &self,
        name: &str,
        key: &str,
        value: &Value,
        args: &[Value],
        path: &str,
    ) -> Result<MapperOutcome> {
        let function = self.get(name, path)?;

        let mut params = Vec::with_capacity(args.len() + 2);
        params.push(Value::String(key.to_string()));
        params.push(value.clone());
        params.extend(args.iter().cloned());

        let output = match invoke(name, function, &params)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::output_contract(
                    name,
                    format!("output of function must be an object, got {}", type_name(&other)),
                ))
            }
        };

        let key = match output.get("key") {
            Some(Value::String(key)) => key.clone(),
            Some(other) => {
                return Err(Error::output_contract(
                    name,
                    format!("output key must be a string, got {}", type_name(other)),
                ))
            }
            None => return Err(Error::output_contract(name, "output key is missing")),
        };

        let value = match output.get("value") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.clone()),
        };

        Ok(MapperOutcome { key, value })
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionTable").field("functions", &names).finish()
    }
}

/// Parse `name()` syntax, returning the function name
pub fn function_reference(text: &str) -> Option<&str> {
    let name = text.strip_suffix("()")?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(name)
    } else {
        None
    }
}

fn invoke(name: &str, function: &KeyFunction, args: &[Value]) -> Result<Value> {
    log::trace!("calling {}() with {} argument(s)", name, args.len());
    function(args).map_err(|source| Error::Function {
        function: name.to_string(),
        source,
    })
}

/// Loose truthiness used for predicate match flags
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn starts_with_a() -> FunctionTable {
        FunctionTable::new().with("f", |args| {
            let key = args[0].as_str().unwrap_or_default();
            Ok(json!([key.starts_with('a'), [1, 2, 3]]))
        })
    }

    #[test]
    fn test_function_reference() {
        assert_eq!(function_reference("f()"), Some("f"));
        assert_eq!(function_reference("to_upper2()"), Some("to_upper2"));
        assert_eq!(function_reference("f"), None);
        assert_eq!(function_reference("()"), None);
        assert_eq!(function_reference("2f()"), None);
        assert_eq!(function_reference("a.b()"), None);
    }

    #[test]
    fn test_predicate_with_args() {
        let table = starts_with_a();
        let outcome = table.call_predicate("f", "abc", "$").unwrap();
        assert!(outcome.matched);
        assert_eq!(outcome.args, vec![json!(1), json!(2), json!(3)]);

        let outcome = table.call_predicate("f", "b", "$").unwrap();
        assert!(!outcome.matched);
    }

    #[test]
    fn test_predicate_bool_and_truthiness() {
        let table = FunctionTable::new()
            .with("yes", |_| Ok(json!(true)))
            .with("one", |_| Ok(json!([1])))
            .with("empty", |_| Ok(json!([""])));

        assert!(table.call_predicate("yes", "k", "$").unwrap().matched);
        assert!(table.call_predicate("one", "k", "$").unwrap().matched);
        assert!(!table.call_predicate("empty", "k", "$").unwrap().matched);
    }

    #[test]
    fn test_predicate_contract() {
        let table = FunctionTable::new()
            .with("obj", |_| Ok(json!({"matched": true})))
            .with("bad_args", |_| Ok(json!([true, 5])));

        assert_eq!(table.call_predicate("obj", "k", "$").unwrap_err().kind(), "output_contract");
        assert_eq!(
            table.call_predicate("bad_args", "k", "$").unwrap_err().kind(),
            "output_contract"
        );
    }

    #[test]
    fn test_missing_function() {
        let table = FunctionTable::new();
        let err = table.call_predicate("nope", "k", "$.a").unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_mapper_outcome() {
        let table = FunctionTable::new().with("g", |args| {
            Ok(json!({"key": "b", "value": args[1].as_i64().unwrap_or(0) + 1}))
        });
        let outcome = table.call_mapper("g", "a", &json!(2), &[], "$").unwrap();
        assert_eq!(outcome.key, "b");
        assert_eq!(outcome.value, Some(json!(3)));
    }

    #[test]
    fn test_mapper_receives_extra_args() {
        let table = FunctionTable::new().with("g", |args| Ok(json!({"key": "b", "value": args[2]})));
        let outcome = table.call_mapper("g", "a", &json!(2), &[json!(5)], "$").unwrap();
        assert_eq!(outcome.value, Some(json!(5)));
    }

    #[test]
    fn test_mapper_null_value_keeps_original() {
        let table = FunctionTable::new().with("g", |_| Ok(json!({"key": "b", "value": null})));
        let outcome = table.call_mapper("g", "a", &json!(2), &[], "$").unwrap();
        assert_eq!(outcome.value, None);
    }

    #[test]
    fn test_mapper_contract() {
        let table = FunctionTable::new()
            .with("scalar", |_| Ok(json!("b")))
            .with("numeric_key", |_| Ok(json!({"key": 1})))
            .with("no_key", |_| Ok(json!({"value": 1})));

        for name in ["scalar", "numeric_key", "no_key"] {
            let err = table.call_mapper(name, "a", &json!(1), &[], "$").unwrap_err();
            assert_eq!(err.kind(), "output_contract", "{}", name);
        }
    }

    #[test]
    fn test_function_failure_is_wrapped() {
        let table = FunctionTable::new().with("boom", |_| anyhow::bail!("exploded"));
        let err = table.call_mapper("boom", "a", &json!(1), &[], "$").unwrap_err();
        assert_eq!(err.kind(), "function");
        assert!(err.to_string().contains("exploded"));
    }

    #[test]
    fn test_debug_lists_names() {
        let table = starts_with_a().with("g", |_| Ok(Value::Null));
        assert_eq!(format!("{:?}", table), r#"FunctionTable { functions: ["f", "g"] }"#);
        assert_eq!(table.len(), 2);
        assert!(table.contains("g"));
    }
}
