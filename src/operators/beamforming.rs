use serde_yaml::Value;

use crate::document::node::{Node, Record, float};
use crate::error::Result;
use crate::variants::Variant;

/// Spatial processing over a device's antenna array.
#[derive(Debug, Clone, PartialEq)]
pub enum Beamformer {
    Conventional,
    /// Minimum variance distortionless response, receive only.
    Capon { loading: f64 },
}

impl Variant for Beamformer {
    const EXTENSION_POINT: &'static str = "beamformer";
    const TAGS: &'static [&'static str] = &["ConventionalBeamformer", "CaponBeamformer"];

    fn tag(&self) -> &'static str {
        match self {
            Self::Conventional => "ConventionalBeamformer",
            Self::Capon { .. } => "CaponBeamformer",
        }
    }
}

impl Beamformer {
    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<Self>()?;
        let mut fields = content.fields()?;
        let beamformer = match tag.as_str() {
            "ConventionalBeamformer" => Self::Conventional,
            "CaponBeamformer" => Self::Capon {
                loading: match fields.optional("loading") {
                    Some(n) => n.non_negative()?,
                    None => 0.0,
                },
            },
            _ => return Err(content.unknown_variant::<Self>(&tag)),
        };
        fields.finish()?;
        Ok(beamformer)
    }

    pub(crate) fn emit(&self) -> Value {
        match self {
            Self::Conventional => Record::new(),
            Self::Capon { loading } => Record::new().field("loading", float(*loading)),
        }
        .tagged(self.tag())
    }

    pub fn transmits(&self) -> bool {
        matches!(self, Self::Conventional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Beamformer> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        Beamformer::parse(&Node::root(&value))
    }

    #[test]
    fn capon_loading_defaults_to_zero() {
        assert_eq!(parse("!CaponBeamformer {}").unwrap(), Beamformer::Capon { loading: 0.0 });
        assert_eq!(
            parse("!CaponBeamformer { loading: 1e-4 }").unwrap(),
            Beamformer::Capon { loading: 1e-4 }
        );
        assert!(parse("!CaponBeamformer { loading: -1 }").is_err());
    }

    #[test]
    fn only_conventional_steers_transmissions() {
        assert!(parse("!ConventionalBeamformer {}").unwrap().transmits());
        assert!(!Beamformer::Capon { loading: 0.0 }.transmits());
        assert!(parse("!ConventionalBeamformer { loading: 1 }").is_err());
    }
}
