use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Number, Value};

use crate::error::{Result, ScenarioError};
use crate::variants::Variant;

/// A borrowed document node together with its location in the document.
#[derive(Debug, Clone)]
pub(crate) struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Node<'a> {
    pub fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    pub fn path(&self) -> &str {
        if self.path.is_empty() { "<root>" } else { &self.path }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    fn child(&self, value: &'a Value, key: &str) -> Node<'a> {
        let path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        };
        Node { value, path }
    }

    fn item(&self, value: &'a Value, index: usize) -> Node<'a> {
        Node {
            value,
            path: format!("{}[{}]", self.path, index),
        }
    }

    pub fn mismatch(&self, expected: impl Into<String>) -> ScenarioError {
        ScenarioError::mismatch(self.path(), expected, describe(self.value))
    }

    /// Splits a node into its variant tag and content.
    ///
    /// Only the presence of a tag is checked here, callers match the tag
    /// against their closed set and report the rest via [`Node::unknown_variant`].
    pub fn variant<V: Variant>(&self) -> Result<(String, Node<'a>)> {
        match self.value {
            Value::Tagged(tagged) => Ok((
                tag_name(&tagged.tag),
                Node {
                    value: &tagged.value,
                    path: self.path.clone(),
                },
            )),
            _ => Err(self.unknown_variant::<V>("")),
        }
    }

    pub fn unknown_variant<V: Variant>(&self, tag: &str) -> ScenarioError {
        ScenarioError::Schema {
            location: self.path().to_string(),
            extension_point: V::EXTENSION_POINT,
            tag: tag.to_string(),
            expected: V::TAGS,
        }
    }

    /// Opens the node as a record. A tag without content (`!Tag`) is an empty record.
    pub fn fields(&self) -> Result<Fields<'a>> {
        match self.value {
            Value::Mapping(map) => Ok(Fields {
                node: self.clone(),
                map: Some(map),
                known: Vec::new(),
            }),
            Value::Null => Ok(Fields {
                node: self.clone(),
                map: None,
                known: Vec::new(),
            }),
            _ => Err(self.mismatch("a mapping")),
        }
    }

    pub fn entries(&self) -> Result<Vec<(&'a str, Node<'a>)>> {
        match self.value {
            Value::Null => Ok(Vec::new()),
            Value::Mapping(map) => map
                .iter()
                .map(|(key, value)| match key.as_str() {
                    Some(key) => Ok((key, self.child(value, key))),
                    None => Err(ScenarioError::mismatch(
                        self.path(),
                        "string keys",
                        describe(key),
                    )),
                })
                .collect(),
            _ => Err(self.mismatch("a mapping")),
        }
    }

    pub fn sequence(&self) -> Result<Vec<Node<'a>>> {
        match self.value {
            Value::Null => Ok(Vec::new()),
            Value::Sequence(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(index, item)| self.item(item, index))
                .collect()),
            _ => Err(self.mismatch("a sequence")),
        }
    }

    pub fn str(&self) -> Result<&'a str> {
        self.value.as_str().ok_or_else(|| self.mismatch("a string"))
    }

    pub fn bool(&self) -> Result<bool> {
        self.value.as_bool().ok_or_else(|| self.mismatch("a boolean"))
    }

    pub fn f64(&self) -> Result<f64> {
        self.value
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.mismatch("a finite number"))
    }

    pub fn u64(&self) -> Result<u64> {
        if let Some(v) = self.value.as_u64() {
            return Ok(v);
        }
        // 1e3 style literals arrive as floats
        match self.value.as_f64() {
            Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= 9_007_199_254_740_992.0 => Ok(v as u64),
            _ => Err(self.mismatch("a non-negative integer")),
        }
    }

    pub fn number_in(&self, expected: &str, accept: impl Fn(f64) -> bool) -> Result<f64> {
        let v = self.f64()?;
        if accept(v) { Ok(v) } else { Err(self.mismatch(expected)) }
    }

    pub fn integer_in(&self, expected: &str, accept: impl Fn(u64) -> bool) -> Result<u64> {
        let v = self.u64().map_err(|_| self.mismatch(expected))?;
        if accept(v) { Ok(v) } else { Err(self.mismatch(expected)) }
    }

    pub fn u32_in(&self, expected: &str, accept: impl Fn(u32) -> bool) -> Result<u32> {
        let v = self.integer_in(expected, |v| v <= u64::from(u32::MAX))? as u32;
        if accept(v) { Ok(v) } else { Err(self.mismatch(expected)) }
    }

    pub fn positive(&self) -> Result<f64> {
        self.number_in("a positive number", |v| v > 0.0)
    }

    pub fn non_negative(&self) -> Result<f64> {
        self.number_in("a non-negative number", |v| v >= 0.0)
    }

    pub fn keyword(&self, choices: &[&'static str]) -> Result<&'static str> {
        let expected = || format!("one of {}", choices.join(", "));
        let raw = self.str().map_err(|_| self.mismatch(expected()))?;
        choices
            .iter()
            .copied()
            .find(|choice| choice.eq_ignore_ascii_case(raw))
            .ok_or_else(|| self.mismatch(expected()))
    }
}

/// Field access on a record node. Every queried key counts as known, so
/// [`Fields::finish`] can reject anything else.
#[derive(Debug)]
pub(crate) struct Fields<'a> {
    node: Node<'a>,
    map: Option<&'a Mapping>,
    known: Vec<&'static str>,
}

impl<'a> Fields<'a> {
    pub fn optional(&mut self, key: &'static str) -> Option<Node<'a>> {
        if !self.known.contains(&key) {
            self.known.push(key);
        }
        self.map
            .and_then(|map| map.get(key))
            .filter(|value| !value.is_null())
            .map(|value| self.node.child(value, key))
    }

    pub fn required(&mut self, key: &'static str) -> Result<Node<'a>> {
        self.optional(key).ok_or_else(|| ScenarioError::MissingField {
            location: self.node.path().to_string(),
            field: key.to_string(),
        })
    }

    /// Fails when the record is present although the schema forbids it.
    pub fn forbid(&mut self, key: &'static str, reason: &str) -> Result<()> {
        match self.optional(key) {
            Some(node) => Err(node.mismatch(format!("no `{key}` ({reason})"))),
            None => Ok(()),
        }
    }

    pub fn finish(self) -> Result<()> {
        let Some(map) = self.map else {
            return Ok(());
        };
        for key in map.keys() {
            let Some(key) = key.as_str() else {
                return Err(ScenarioError::mismatch(
                    self.node.path(),
                    "string keys",
                    describe(key),
                ));
            };
            if !self.known.contains(&key) {
                return Err(ScenarioError::UnknownField {
                    location: self.node.path().to_string(),
                    field: key.to_string(),
                    expected: self.known.iter().map(|k| k.to_string()).collect(),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn tag_name(tag: &Tag) -> String {
    tag.to_string()
        .trim_start_matches('!')
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}

pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Sequence(items) => format!("a sequence of {} items", items.len()),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("a node tagged !{}", tag_name(&tagged.tag)),
    }
}

#[derive(Debug, Default)]
pub(crate) struct Record(Mapping);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(Value::String(key.to_string()), value.into());
        self
    }

    pub fn optional(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    pub fn tagged(self, tag: &str) -> Value {
        tagged(tag, Value::Mapping(self.0))
    }

    pub fn into_value(self) -> Value {
        Value::Mapping(self.0)
    }
}

pub(crate) fn tagged(tag: &str, value: Value) -> Value {
    Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(tag),
        value,
    }))
}

pub(crate) fn float(v: f64) -> Value {
    Value::Number(Number::from(v))
}

pub(crate) fn int(v: u64) -> Value {
    Value::Number(Number::from(v))
}

pub(crate) fn floats(values: &[f64]) -> Value {
    Value::Sequence(values.iter().copied().map(float).collect())
}
