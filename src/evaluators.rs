use crate::channels::ChannelId;
use crate::document::node::{Fields, Node, Record, float, int};
use crate::error::Result;
use crate::operators::OperatorId;
use crate::variants::Variant;

/// A performance statistic the engine collects per grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    pub metric: Metric,
    pub subjects: Subjects,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Metric {
    BitError,
    BlockError,
    FrameError,
    Throughput,
    ReceiverOperatingCharacteristic { num_thresholds: u32 },
}

impl Variant for Metric {
    const EXTENSION_POINT: &'static str = "evaluator";
    const TAGS: &'static [&'static str] = &[
        "BitErrorEvaluator",
        "BlockErrorEvaluator",
        "FrameErrorEvaluator",
        "ThroughputEvaluator",
        "ReceiverOperatingCharacteristic",
    ];

    fn tag(&self) -> &'static str {
        match self {
            Self::BitError => "BitErrorEvaluator",
            Self::BlockError => "BlockErrorEvaluator",
            Self::FrameError => "FrameErrorEvaluator",
            Self::Throughput => "ThroughputEvaluator",
            Self::ReceiverOperatingCharacteristic { .. } => "ReceiverOperatingCharacteristic",
        }
    }
}

impl Metric {
    pub const DEFAULT_NUM_THRESHOLDS: u32 = 101;

    pub(crate) fn parse(tag: &str, node: &Node, fields: &mut Fields) -> Result<Self> {
        Ok(match tag {
            "BitErrorEvaluator" => Self::BitError,
            "BlockErrorEvaluator" => Self::BlockError,
            "FrameErrorEvaluator" => Self::FrameError,
            "ThroughputEvaluator" => Self::Throughput,
            "ReceiverOperatingCharacteristic" => Self::ReceiverOperatingCharacteristic {
                num_thresholds: match fields.optional("num_thresholds") {
                    Some(n) => n.u32_in("an integer >= 2", |v| v >= 2)?,
                    None => Self::DEFAULT_NUM_THRESHOLDS,
                },
            },
            _ => return Err(node.unknown_variant::<Self>(tag)),
        })
    }

    pub(crate) fn emit_fields(&self, record: Record) -> Record {
        match self {
            Self::ReceiverOperatingCharacteristic { num_thresholds } => {
                record.field("num_thresholds", int(u64::from(*num_thresholds)))
            }
            _ => record,
        }
    }

    /// Link metrics compare a transmitting and a receiving modem, the
    /// remaining ones observe a sensing operator.
    pub fn is_link_metric(&self) -> bool {
        !matches!(self, Self::ReceiverOperatingCharacteristic { .. })
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::BitError => "BER",
            Self::BlockError => "BLER",
            Self::FrameError => "FER",
            Self::Throughput => "DR",
            Self::ReceiverOperatingCharacteristic { .. } => "ROC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subjects {
    Link {
        transmitting: OperatorId,
        receiving: OperatorId,
    },
    Sensing {
        radar: OperatorId,
        channel: Option<ChannelId>,
    },
}

/// Monte-Carlo stopping controls of an evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Required confidence in (0, 1], 1 disables early stopping.
    pub confidence: f64,
    /// Accepted deviation of the estimate.
    pub tolerance: f64,
    pub plot_surface: bool,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            confidence: 1.0,
            tolerance: 0.0,
            plot_surface: true,
        }
    }
}

impl Statistics {
    pub(crate) fn parse(fields: &mut Fields) -> Result<Self> {
        let mut statistics = Self::default();
        if let Some(n) = fields.optional("confidence") {
            statistics.confidence = n.number_in("a confidence level in (0, 1]", |c| c > 0.0 && c <= 1.0)?;
        }
        if let Some(n) = fields.optional("tolerance") {
            statistics.tolerance = n.non_negative()?;
        }
        if let Some(n) = fields.optional("plot_surface") {
            statistics.plot_surface = n.bool()?;
        }
        Ok(statistics)
    }

    pub(crate) fn emit_fields(&self, record: Record) -> Record {
        record
            .field("confidence", float(self.confidence))
            .field("tolerance", float(self.tolerance))
            .field("plot_surface", self.plot_surface)
    }

    pub fn allows_early_stop(&self) -> bool {
        self.confidence < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn statistics(text: &str) -> Result<Statistics> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        let node = Node::root(&value);
        let mut fields = node.fields()?;
        let statistics = Statistics::parse(&mut fields)?;
        fields.finish()?;
        Ok(statistics)
    }

    #[test]
    fn statistics_default_to_exhaustive_sampling() {
        let statistics = statistics("{}").unwrap();
        assert_eq!(statistics, Statistics::default());
        assert!(!statistics.allows_early_stop());
    }

    #[test]
    fn confidence_must_be_a_probability() {
        assert!(statistics("{ confidence: 0.95, tolerance: 1e-3 }").unwrap().allows_early_stop());
        assert!(statistics("{ confidence: 0 }").is_err());
        assert!(statistics("{ confidence: 1.5 }").is_err());
        assert!(statistics("{ tolerance: -0.1 }").is_err());
    }

    #[test]
    fn only_roc_observes_a_radar() {
        assert!(Metric::Throughput.is_link_metric());
        assert!(!Metric::ReceiverOperatingCharacteristic { num_thresholds: 11 }.is_link_metric());
    }
}
