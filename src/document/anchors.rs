//! Anchor bookkeeping for `&name` / `*name`.
//!
//! serde_yaml expands every `*name` into a copy of the anchored node, which
//! loses identity when two declarations happen to be equal. The event stream
//! still carries anchor ids, so a second read records where each alias points.

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

use crate::error::Result;

/// Maps the location of every `*alias` to the location of its anchored node.
#[derive(Debug, Clone, Default)]
pub(crate) struct Anchors {
    targets: HashMap<String, String>,
}

impl Anchors {
    pub fn scan(text: &str) -> Result<Self> {
        if !text.contains('*') {
            return Ok(Self::default());
        }
        let mut recorder = Recorder::default();
        Parser::new_from_str(text).load(&mut recorder, false)?;
        Ok(recorder.anchors)
    }

    pub fn target(&self, location: &str) -> Option<&str> {
        self.targets.get(location).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

// Locations are None below non-scalar mapping keys
enum Frame {
    Sequence {
        path: Option<String>,
        next: usize,
    },
    Mapping {
        path: Option<String>,
        key: Option<String>,
        value_next: bool,
    },
}

enum Slot {
    Key,
    Value(Option<String>),
}

#[derive(Default)]
struct Recorder {
    frames: Vec<Frame>,
    defined: HashMap<usize, String>,
    anchors: Anchors,
}

impl Recorder {
    /// Claims the slot of the node that starts with the current event.
    fn slot(&mut self) -> Slot {
        match self.frames.last_mut() {
            None => Slot::Value(Some(String::new())),
            Some(Frame::Sequence { path, next }) => {
                let location = path.as_ref().map(|path| format!("{path}[{next}]"));
                *next += 1;
                Slot::Value(location)
            }
            Some(Frame::Mapping { path, key, value_next }) => {
                if *value_next {
                    *value_next = false;
                    let location = match (path.as_deref(), key.take()) {
                        (Some(""), Some(key)) => Some(key),
                        (Some(path), Some(key)) => Some(format!("{path}.{key}")),
                        _ => None,
                    };
                    Slot::Value(location)
                } else {
                    *value_next = true;
                    Slot::Key
                }
            }
        }
    }

    fn define(&mut self, anchor: usize, location: Option<&String>) {
        // id 0 marks a node without anchor
        if anchor == 0 {
            return;
        }
        if let Some(location) = location {
            self.defined.insert(anchor, location.clone());
        }
    }

    fn open(&mut self, anchor: usize, mapping: bool) {
        let path = match self.slot() {
            Slot::Key => None,
            Slot::Value(location) => location,
        };
        self.define(anchor, path.as_ref());
        self.frames.push(if mapping {
            Frame::Mapping {
                path,
                key: None,
                value_next: false,
            }
        } else {
            Frame::Sequence { path, next: 0 }
        });
    }
}

impl MarkedEventReceiver for Recorder {
    fn on_event(&mut self, event: Event, _mark: Marker) {
        match event {
            Event::Scalar(value, _, anchor, _) => match self.slot() {
                Slot::Key => {
                    if let Some(Frame::Mapping { key, .. }) = self.frames.last_mut() {
                        *key = Some(value);
                    }
                }
                Slot::Value(location) => self.define(anchor, location.as_ref()),
            },
            Event::SequenceStart(anchor, _) => self.open(anchor, false),
            Event::MappingStart(anchor, _) => self.open(anchor, true),
            Event::SequenceEnd | Event::MappingEnd => {
                self.frames.pop();
            }
            Event::Alias(anchor) => {
                if let Slot::Value(Some(location)) = self.slot() {
                    if let Some(target) = self.defined.get(&anchor) {
                        self.anchors.targets.insert(location, target.clone());
                    }
                }
            }
            _ => {}
        }
    }
}
