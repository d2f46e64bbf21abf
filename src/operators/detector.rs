use serde_yaml::Value;

use crate::document::node::{Node, Record, float, int};
use crate::error::Result;
use crate::variants::Variant;

/// Target detection applied to a radar cube.
#[derive(Debug, Clone, PartialEq)]
pub enum Detector {
    Threshold { min_power: f64 },
    Max,
    /// Cell-averaging constant false alarm rate detection.
    Cfar {
        num_training_cells: u32,
        num_guard_cells: u32,
        false_alarm_probability: f64,
    },
}

impl Variant for Detector {
    const EXTENSION_POINT: &'static str = "detector";
    const TAGS: &'static [&'static str] = &["ThresholdDetector", "MaxDetector", "CFARDetector"];

    fn tag(&self) -> &'static str {
        match self {
            Self::Threshold { .. } => "ThresholdDetector",
            Self::Max => "MaxDetector",
            Self::Cfar { .. } => "CFARDetector",
        }
    }
}

impl Detector {
    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<Self>()?;
        let mut fields = content.fields()?;
        let detector = match tag.as_str() {
            "ThresholdDetector" => Self::Threshold {
                min_power: fields.required("min_power")?.non_negative()?,
            },
            "MaxDetector" => Self::Max,
            "CFARDetector" => Self::Cfar {
                num_training_cells: fields
                    .required("num_training_cells")?
                    .u32_in("an integer >= 1", |v| v >= 1)?,
                num_guard_cells: match fields.optional("num_guard_cells") {
                    Some(n) => n.u32_in("a non-negative integer", |_| true)?,
                    None => 0,
                },
                false_alarm_probability: fields
                    .required("false_alarm_probability")?
                    .number_in("a probability in (0, 1)", |p| p > 0.0 && p < 1.0)?,
            },
            _ => return Err(content.unknown_variant::<Self>(&tag)),
        };
        fields.finish()?;
        Ok(detector)
    }

    pub(crate) fn emit(&self) -> Value {
        match self {
            Self::Threshold { min_power } => Record::new().field("min_power", float(*min_power)),
            Self::Max => Record::new(),
            Self::Cfar {
                num_training_cells,
                num_guard_cells,
                false_alarm_probability,
            } => Record::new()
                .field("num_training_cells", int(u64::from(*num_training_cells)))
                .field("num_guard_cells", int(u64::from(*num_guard_cells)))
                .field("false_alarm_probability", float(*false_alarm_probability)),
        }
        .tagged(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Detector> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        Detector::parse(&Node::root(&value))
    }

    #[test]
    fn cfar_defaults_guard_cells() {
        let detector = parse("!CFARDetector { num_training_cells: 8, false_alarm_probability: 1e-3 }").unwrap();
        assert_eq!(
            detector,
            Detector::Cfar {
                num_training_cells: 8,
                num_guard_cells: 0,
                false_alarm_probability: 1e-3,
            }
        );
    }

    #[test]
    fn false_alarm_probability_is_open_interval() {
        assert!(parse("!CFARDetector { num_training_cells: 8, false_alarm_probability: 1 }").is_err());
        assert!(parse("!CFARDetector { num_training_cells: 8, false_alarm_probability: 0 }").is_err());
    }

    #[test]
    fn max_detector_has_no_parameters() {
        assert_eq!(parse("!MaxDetector {}").unwrap(), Detector::Max);
        assert!(parse("!MaxDetector { min_power: 1 }").is_err());
    }
}
