//! Destination resolution for leaf correspondences
//!
//! Turns a destination rule plus a key match into the concrete path to write
//! and the value to write there.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use crate::keymap::{Destination, FunctionTable, KeyMatch};
use crate::{Error, Result};
use serde_json::Value;

/// A fully resolved write
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Destination path with captures and wildcards substituted
    pub path: String,
    pub value: Value,
}

/// Resolve `destination` for a matched key/value pair
///
/// `path` is the input location, used in error messages.
pub fn resolve(
    destination: &Destination,
    matched: &KeyMatch<'_>,
    value: &Value,
    counters: &[usize],
    functions: &FunctionTable,
    path: &str,
) -> Result<Resolved> {
    match destination {
        Destination::Path(template) => {
            let substituted = match matched {
                KeyMatch::Pattern { key, pattern } => pattern.substitute(key, template),
                _ => template.clone(),
            };
            Ok(Resolved {
                path: substitute_wildcards(&substituted, counters, path)?,
                value: value.clone(),
            })
        }
        Destination::Mapper(name) => {
            let outcome = functions.call_mapper(name, matched.key(), value, matched.args(), path)?;
            Ok(Resolved {
                path: substitute_wildcards(&outcome.key, counters, path)?,
                value: outcome.value.unwrap_or_else(|| value.clone()),
            })
        }
    }
}

/// Resolve a bare destination for a sequence element (no key match involved)
pub fn resolve_element(
    destination: &Destination,
    index: usize,
    value: &Value,
    counters: &[usize],
    functions: &FunctionTable,
    path: &str,
) -> Result<Resolved> {
    match destination {
        Destination::Path(template) => Ok(Resolved {
            path: substitute_wildcards(template, counters, path)?,
            value: value.clone(),
        }),
        Destination::Mapper(name) => {
            let key = index.to_string();
            let outcome = functions.call_mapper(name, &key, value, &[], path)?;
            Ok(Resolved {
                path: substitute_wildcards(&outcome.key, counters, path)?,
                value: outcome.value.unwrap_or_else(|| value.clone()),
            })
        }
    }
}

/// Replace every `%` / `%N` with the matching sequence iteration index
///
/// A bare `%` is the innermost open sequence; `%N` is depth `N`, outermost
/// first. Digits following `%` are always read greedily.
pub fn substitute_wildcards(template: &str, counters: &[usize], path: &str) -> Result<String> {
    if !template.contains('%') {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }

        let mut digits = String::new();
        while let Some(&d) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }

        let counter = if digits.is_empty() {
            counters.last().copied().ok_or_else(|| {
                Error::configuration(
                    format!("wildcard `%` in `{}` used outside of any sequence", template),
                    path,
                )
            })?
        } else {
            digits
                .parse::<usize>()
                .ok()
                .and_then(|depth| counters.get(depth).copied())
                .ok_or_else(|| {
                    Error::configuration(
                        format!(
                            "wildcard `%{}` in `{}` refers to a sequence depth that is not open ({} open)",
                            digits,
                            template,
                            counters.len()
                        ),
                        path,
                    )
                })?
        };
        out.push_str(&counter.to_string());
    }

    Ok(out)
}
