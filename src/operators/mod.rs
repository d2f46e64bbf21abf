pub mod beamforming;
pub mod detector;
pub mod precoding;
pub mod waveform;

pub use beamforming::Beamformer;
pub use detector::Detector;
pub use precoding::{Precoding, SymbolPrecoder};
pub use waveform::{ChannelEqualization, ChannelEstimation, PulseShape, Synchronization, WaveformConfig};

use crate::devices::DeviceId;
use crate::document::node::{Fields, Node, Record, float, int};
use crate::error::Result;
use crate::variants::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(usize);

impl OperatorId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A signal processing role bound to exactly one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub alias: String,
    pub device: DeviceId,
    pub role: OperatorRole,
    /// Device whose transmission serves as channel estimation reference.
    pub reference: Option<DeviceId>,
    pub waveform: Option<WaveformConfig>,
    pub detector: Option<Detector>,
    pub beamformer: Option<Beamformer>,
    pub precoding: Option<Precoding>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorRole {
    Modem,
    TransmittingModem,
    ReceivingModem,
    /// Joint communication and sensing, correlates its own transmission.
    MatchedFilterJcas { max_range: f64 },
    SilentTransmitter { num_samples: u64, sampling_rate: f64 },
}

impl Variant for OperatorRole {
    const EXTENSION_POINT: &'static str = "operator";
    const TAGS: &'static [&'static str] = &[
        "Modem",
        "TransmittingModem",
        "ReceivingModem",
        "MatchedFilterJcas",
        "SilentTransmitter",
    ];

    fn tag(&self) -> &'static str {
        match self {
            Self::Modem => "Modem",
            Self::TransmittingModem => "TransmittingModem",
            Self::ReceivingModem => "ReceivingModem",
            Self::MatchedFilterJcas { .. } => "MatchedFilterJcas",
            Self::SilentTransmitter { .. } => "SilentTransmitter",
        }
    }
}

impl OperatorRole {
    pub(crate) fn parse(tag: &str, node: &Node, fields: &mut Fields) -> Result<Self> {
        // device, reference, waveform etc. are read by the caller
        Ok(match tag {
            "Modem" => Self::Modem,
            "TransmittingModem" => Self::TransmittingModem,
            "ReceivingModem" => Self::ReceivingModem,
            "MatchedFilterJcas" => Self::MatchedFilterJcas {
                max_range: fields.required("max_range")?.positive()?,
            },
            "SilentTransmitter" => Self::SilentTransmitter {
                num_samples: fields
                    .required("num_samples")?
                    .integer_in("an integer >= 1", |v| v >= 1)?,
                sampling_rate: fields.required("sampling_rate")?.positive()?,
            },
            _ => return Err(node.unknown_variant::<Self>(tag)),
        })
    }

    pub(crate) fn emit_fields(&self, record: Record) -> Record {
        match self {
            Self::Modem | Self::TransmittingModem | Self::ReceivingModem => record,
            Self::MatchedFilterJcas { max_range } => record.field("max_range", float(*max_range)),
            Self::SilentTransmitter { num_samples, sampling_rate } => record
                .field("num_samples", int(*num_samples))
                .field("sampling_rate", float(*sampling_rate)),
        }
    }

    pub fn transmits_data(&self) -> bool {
        matches!(self, Self::Modem | Self::TransmittingModem | Self::MatchedFilterJcas { .. })
    }

    pub fn receives_data(&self) -> bool {
        matches!(self, Self::Modem | Self::ReceivingModem | Self::MatchedFilterJcas { .. })
    }

    pub fn is_sensing(&self) -> bool {
        matches!(self, Self::MatchedFilterJcas { .. })
    }

    pub fn requires_waveform(&self) -> bool {
        self.transmits_data() || self.receives_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_capabilities() {
        let jcas = OperatorRole::MatchedFilterJcas { max_range: 100.0 };
        assert!(jcas.transmits_data() && jcas.receives_data() && jcas.is_sensing());

        assert!(OperatorRole::TransmittingModem.transmits_data());
        assert!(!OperatorRole::TransmittingModem.receives_data());

        let silent = OperatorRole::SilentTransmitter {
            num_samples: 10,
            sampling_rate: 1e6,
        };
        assert!(!silent.requires_waveform());
        assert!(!silent.transmits_data());
    }
}
