use serde_yaml::Value;

use crate::document::node::{Node, Record, tagged};
use crate::error::Result;
use crate::variants::Variant;

/// Ordered chain of stream precoders applied to a modem's symbols.
#[derive(Debug, Clone, PartialEq)]
pub enum Precoding {
    Symbol(Vec<SymbolPrecoder>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPrecoder {
    ZeroForcing,
}

impl Variant for Precoding {
    const EXTENSION_POINT: &'static str = "precoding";
    const TAGS: &'static [&'static str] = &["SymbolCoding"];

    fn tag(&self) -> &'static str {
        match self {
            Self::Symbol(_) => "SymbolCoding",
        }
    }
}

impl Variant for SymbolPrecoder {
    const EXTENSION_POINT: &'static str = "symbol precoder";
    const TAGS: &'static [&'static str] = &["ZF"];

    fn tag(&self) -> &'static str {
        match self {
            Self::ZeroForcing => "ZF",
        }
    }
}

impl Precoding {
    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<Self>()?;
        match tag.as_str() {
            "SymbolCoding" => match content.value() {
                Value::Sequence(_) => Ok(Self::Symbol(
                    content
                        .sequence()?
                        .iter()
                        .map(SymbolPrecoder::parse)
                        .collect::<Result<Vec<_>>>()?,
                )),
                Value::Null => Ok(Self::Symbol(Vec::new())),
                Value::String(s) if s.is_empty() => Ok(Self::Symbol(Vec::new())),
                _ => Err(content.mismatch("a sequence of symbol precoders")),
            },
            _ => Err(content.unknown_variant::<Self>(&tag)),
        }
    }

    pub(crate) fn emit(&self) -> Value {
        match self {
            Self::Symbol(precoders) => tagged(
                self.tag(),
                Value::Sequence(precoders.iter().map(SymbolPrecoder::emit).collect()),
            ),
        }
    }

    pub fn precoders(&self) -> &[SymbolPrecoder] {
        match self {
            Self::Symbol(precoders) => precoders,
        }
    }
}

impl SymbolPrecoder {
    fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<Self>()?;
        let precoder = match tag.as_str() {
            "ZF" => Self::ZeroForcing,
            _ => return Err(content.unknown_variant::<Self>(&tag)),
        };
        // `!ZF` arrives as an empty scalar
        if content.value().as_str() != Some("") {
            content.fields()?.finish()?;
        }
        Ok(precoder)
    }

    fn emit(&self) -> Value {
        Record::new().tagged(self.tag())
    }
}
