//! Traversal state for a single transform
//!
//! The context owns the output tree while it is being built. Output
//! containers currently open for writing form the navigation stack; each
//! frame is owned by the stack while it is open and attached to its parent
//! when it is closed. The counter stack holds the iteration index of every
//! open sequence.
//!
//! Copyright (c) 2025 Remap Team
//! Licensed under the Apache-2.0 license

use crate::keymap::{parse_key, KeyToken};
use crate::{EngineConfig, Error, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Where a closed frame is attached in its parent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Field(String),
    Index(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Field(name) => write!(f, "{}", name),
            Slot::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Position of a slot in the output tree, from the root
type Location = Vec<Slot>;

#[derive(Debug)]
struct Frame {
    container: Value,
    /// `None` only for the root frame
    slot: Option<Slot>,
    /// Where `container` ends up once every open frame is attached
    location: Location,
    /// Slots written with an explicit `null`, as opposed to sequence padding
    nulls: HashSet<Location>,
}

/// Navigation and counter stacks for one top-level transform
#[derive(Debug)]
pub struct TraversalContext {
    frames: Vec<Frame>,
    counters: Vec<usize>,
    config: EngineConfig,
}

impl TraversalContext {
    /// Start a traversal whose output root is `root`
    pub fn new(root: Value, config: EngineConfig) -> Self {
        Self {
            frames: vec![Frame {
                container: root,
                slot: None,
                location: Location::new(),
                nulls: HashSet::new(),
            }],
            counters: Vec::new(),
            config,
        }
    }

    /// Number of nested frames open above the root
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Iteration indices of the open sequences, outermost first
    pub fn counters(&self) -> &[usize] {
        &self.counters
    }

    /// Run `body` with a fresh container pushed as the current frame
    ///
    /// The frame is popped whether or not `body` succeeds. On success the
    /// container is attached at `slot` in the parent frame, unless it is empty
    /// and pruning is enabled. While the frame is open its slot is reserved:
    /// writing a value onto it from inside is a collision.
    pub fn with_frame<T, F>(&mut self, container: Value, slot: Slot, path: &str, body: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if let Some(limit) = self.config.max_depth {
            if self.depth() >= limit {
                return Err(Error::DepthLimit {
                    limit,
                    path: path.to_string(),
                });
            }
        }

        let mut location = self
            .frames
            .last()
            .map(|parent| parent.location.clone())
            .unwrap_or_default();
        location.push(slot.clone());

        self.frames.push(Frame {
            container,
            slot: Some(slot),
            location,
            nulls: HashSet::new(),
        });
        let result = body(self);
        let frame = self.frames.pop();

        match (result, frame) {
            (Ok(value), Some(frame)) => {
                self.attach(frame, path)?;
                Ok(value)
            }
            (result, _) => result,
        }
    }

    /// Run `body` inside a new sequence iteration context starting at index 0
    pub fn with_sequence<T, F>(&mut self, body: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.counters.push(0);
        let result = body(self);
        self.counters.pop();
        result
    }

    /// Set the iteration index of the innermost open sequence
    pub fn set_index(&mut self, index: usize) {
        if let Some(counter) = self.counters.last_mut() {
            *counter = index;
        }
    }

    /// Whether the current frame already holds a value under `key`
    pub fn is_occupied(&self, key: &str) -> bool {
        let frame = match self.frames.last() {
            Some(frame) => frame,
            None => return false,
        };
        match &frame.container {
            Value::Object(map) => match map.get(key) {
                None | Some(Value::Null) => {
                    let mut location = frame.location.clone();
                    location.push(Slot::Field(key.to_string()));
                    frame.nulls.contains(&location)
                }
                Some(_) => true,
            },
            _ => false,
        }
    }

    /// Write `value` at a resolved destination path relative to the current frame
    pub fn write(&mut self, destination: &str, value: Value, path: &str) -> Result<()> {
        let tokens = parse_key(destination);
        let ascend = tokens.iter().take_while(|token| token.is_elevator()).count();

        let (last, intermediate) = match tokens[ascend..].split_last() {
            Some(split) => split,
            None => {
                return Err(Error::navigation(
                    "destination does not name a field to write",
                    destination,
                ))
            }
        };

        let top = self.frames.len() - 1;
        let origin = top.checked_sub(ascend).ok_or_else(|| {
            Error::navigation(
                format!("cannot go up {} level(s) from depth {}", ascend, top),
                destination,
            )
        })?;

        log::debug!("writing {} -> `{}` (frame {} of {})", path, destination, origin, top);

        let collision = || Error::Collision {
            destination: destination.to_string(),
            path: path.to_string(),
        };
        let max_padding = self.config.max_sequence_padding;
        let (below, open) = self.frames.split_at_mut(origin + 1);
        let frame = &mut below[origin];
        let mut location = frame.location.clone();

        let mut current = &mut frame.container;
        for (i, token) in intermediate.iter().enumerate() {
            let next = intermediate.get(i + 1).unwrap_or(last);
            let (slot, step) = slot_for_write(current, token, destination, max_padding)?;
            location.push(step);
            if slot.is_null() {
                if frame.nulls.contains(&location) {
                    return Err(collision());
                }
                *slot = fresh_container(next);
            }
            if !(slot.is_object() || slot.is_array()) {
                return Err(collision());
            }
            current = slot;
        }

        let (slot, step) = slot_for_write(current, last, destination, max_padding)?;
        location.push(step);
        let reserved = open.iter().any(|open_frame| open_frame.location == location);
        if reserved || !slot.is_null() || frame.nulls.contains(&location) {
            return Err(collision());
        }
        if value.is_null() {
            frame.nulls.insert(location);
        }
        *slot = value;
        Ok(())
    }

    /// Hand back the finished output tree
    pub fn finish(self) -> Value {
        self.frames
            .into_iter()
            .next()
            .map(|frame| frame.container)
            .unwrap_or(Value::Null)
    }

    fn attach(&mut self, frame: Frame, path: &str) -> Result<()> {
        let Frame {
            container,
            slot,
            location,
            nulls,
        } = frame;
        let slot = match slot {
            Some(slot) => slot,
            None => return Ok(()),
        };
        if self.config.prune_empty_containers && is_empty_container(&container) {
            log::trace!("pruning empty container at `{}` ({})", slot, path);
            return Ok(());
        }

        let collision = || Error::Collision {
            destination: slot.to_string(),
            path: path.to_string(),
        };

        let parent = match self.frames.last_mut() {
            Some(parent) => parent,
            None => return Err(collision()),
        };
        let target = match (&mut parent.container, &slot) {
            (Value::Object(map), Slot::Field(key)) => map.entry(key.clone()).or_insert(Value::Null),
            (Value::Array(items), Slot::Index(index)) => {
                padded_slot(items, *index, usize::MAX).ok_or_else(collision)?
            }
            _ => return Err(collision()),
        };

        let mut cursor = location;
        merge_into(target, container, &mut cursor, &parent.nulls, &nulls).map_err(|_| collision())?;
        parent.nulls.extend(nulls);
        Ok(())
    }
}

fn fresh_container(next: &KeyToken) -> Value {
    match next {
        KeyToken::ArrayKey(_) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

/// The slot at `index`, padding the sequence with at most `max_padding` nulls
fn padded_slot(items: &mut Vec<Value>, index: usize, max_padding: usize) -> Option<&mut Value> {
    if index >= items.len() {
        if index - items.len() > max_padding {
            return None;
        }
        items.resize(index.checked_add(1)?, Value::Null);
    }
    items.get_mut(index)
}

/// Locate (creating if absent) the slot `token` names inside `current`
fn slot_for_write<'v>(
    current: &'v mut Value,
    token: &KeyToken,
    destination: &str,
    max_padding: usize,
) -> Result<(&'v mut Value, Slot)> {
    match (current, token) {
        (Value::Object(map), KeyToken::Key(key)) => Ok((
            map.entry(key.clone()).or_insert(Value::Null),
            Slot::Field(key.clone()),
        )),
        (Value::Object(map), KeyToken::ArrayKey(index)) => {
            let key = index.to_string();
            Ok((map.entry(key.clone()).or_insert(Value::Null), Slot::Field(key)))
        }
        (Value::Array(items), KeyToken::ArrayKey(index)) => {
            let len = items.len();
            match padded_slot(items, *index, max_padding) {
                Some(slot) => Ok((slot, Slot::Index(*index))),
                None => Err(Error::navigation(
                    format!(
                        "index {} is more than {} past the end of a sequence of length {}",
                        index, max_padding, len
                    ),
                    destination,
                )),
            }
        }
        (Value::Array(_), KeyToken::Key(key)) => Err(Error::navigation(
            format!("cannot address field `{}` of a sequence", key),
            destination,
        )),
        (_, KeyToken::Elevator) => Err(Error::navigation(
            "elevators must come before every field in a destination",
            destination,
        )),
        (other, _) => Err(Error::navigation(
            format!("cannot write into a {}", crate::keymap::functions::type_name(other)),
            destination,
        )),
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Merge `incoming` into `target`, both located at `location`
///
/// Padding nulls on either side accept anything; explicitly written nulls
/// (recorded in the two sets) count as values.
fn merge_into(
    target: &mut Value,
    incoming: Value,
    location: &mut Location,
    target_nulls: &HashSet<Location>,
    incoming_nulls: &HashSet<Location>,
) -> std::result::Result<(), ()> {
    let target_written = !target.is_null() || target_nulls.contains(&*location);
    if incoming.is_null() {
        if target_written && incoming_nulls.contains(&*location) {
            return Err(());
        }
        return Ok(());
    }
    if target.is_null() {
        if target_written {
            return Err(());
        }
        *target = incoming;
        return Ok(());
    }

    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                location.push(Slot::Field(key.clone()));
                let slot = existing.entry(key).or_insert(Value::Null);
                let merged = merge_into(slot, value, location, target_nulls, incoming_nulls);
                location.pop();
                merged?;
            }
            Ok(())
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            for (index, value) in incoming.into_iter().enumerate() {
                location.push(Slot::Index(index));
                let merged = match padded_slot(existing, index, usize::MAX) {
                    Some(slot) => merge_into(slot, value, location, target_nulls, incoming_nulls),
                    None => Err(()),
                };
                location.pop();
                merged?;
            }
            Ok(())
        }
        _ => Err(()),
    }
}
