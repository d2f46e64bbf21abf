use serde_yaml::Value;

use crate::document::node::{Node, Record, float, floats, int};
use crate::error::Result;
use crate::variants::Variant;

/// Handle of a device inside a [`Scenario`](crate::Scenario).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(usize);

impl DeviceId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub alias: String,
    pub kind: DeviceKind,
}

impl Device {
    pub fn carrier_frequency(&self) -> f64 {
        match &self.kind {
            DeviceKind::Simulated(device) => device.carrier_frequency,
        }
    }

    pub fn num_antennas(&self) -> u32 {
        match &self.kind {
            DeviceKind::Simulated(device) => device.num_antennas,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceKind {
    Simulated(SimulatedDevice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedDevice {
    /// Hz.
    pub carrier_frequency: f64,
    pub sampling_rate: Option<f64>,
    pub num_antennas: u32,
    pub position: Option<[f64; 3]>,
    pub isolation: Option<Isolation>,
    pub phase_noise: Option<PhaseNoise>,
}

impl SimulatedDevice {
    pub fn new(carrier_frequency: f64) -> Self {
        Self {
            carrier_frequency,
            sampling_rate: None,
            num_antennas: 1,
            position: None,
            isolation: None,
            phase_noise: None,
        }
    }
}

impl Variant for DeviceKind {
    const EXTENSION_POINT: &'static str = "device";
    const TAGS: &'static [&'static str] = &["SimulatedDevice"];

    fn tag(&self) -> &'static str {
        match self {
            Self::Simulated(_) => "SimulatedDevice",
        }
    }
}

impl DeviceKind {
    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<Self>()?;
        match tag.as_str() {
            "SimulatedDevice" => {
                let mut fields = content.fields()?;
                let carrier_frequency = fields.required("carrier_frequency")?.non_negative()?;
                let sampling_rate = fields
                    .optional("sampling_rate")
                    .map(|n| n.positive())
                    .transpose()?;
                let num_antennas = match fields.optional("num_antennas") {
                    Some(n) => n.u32_in("an integer >= 1", |v| v >= 1)?,
                    None => 1,
                };
                let position = fields.optional("position").map(|n| parse_position(&n)).transpose()?;
                let isolation = fields.optional("isolation").map(|n| Isolation::parse(&n)).transpose()?;
                let phase_noise = fields
                    .optional("phase_noise")
                    .map(|n| PhaseNoise::parse(&n))
                    .transpose()?;
                fields.finish()?;
                Ok(Self::Simulated(SimulatedDevice {
                    carrier_frequency,
                    sampling_rate,
                    num_antennas,
                    position,
                    isolation,
                    phase_noise,
                }))
            }
            _ => Err(content.unknown_variant::<Self>(&tag)),
        }
    }

    pub(crate) fn emit(&self) -> Value {
        match self {
            Self::Simulated(device) => Record::new()
                .field("carrier_frequency", float(device.carrier_frequency))
                .optional("sampling_rate", device.sampling_rate.map(float))
                .field("num_antennas", int(u64::from(device.num_antennas)))
                .optional("position", device.position.map(|p| floats(&p)))
                .optional("isolation", device.isolation.as_ref().map(Isolation::emit))
                .optional("phase_noise", device.phase_noise.as_ref().map(PhaseNoise::emit))
                .tagged(self.tag()),
        }
    }
}

fn parse_position(node: &Node) -> Result<[f64; 3]> {
    let items = node.sequence()?;
    if items.len() != 3 {
        return Err(node.mismatch("a position [x, y, z]"));
    }
    Ok([items[0].f64()?, items[1].f64()?, items[2].f64()?])
}

/// Transmit/receive isolation model of a device.
#[derive(Debug, Clone, PartialEq)]
pub enum Isolation {
    Perfect,
    /// Linear leakage power factor from transmit to receive chain.
    Specific { isolation: f64 },
}

impl Variant for Isolation {
    const EXTENSION_POINT: &'static str = "isolation";
    const TAGS: &'static [&'static str] = &["PerfectIsolation", "SpecificIsolation"];

    fn tag(&self) -> &'static str {
        match self {
            Self::Perfect => "PerfectIsolation",
            Self::Specific { .. } => "SpecificIsolation",
        }
    }
}

impl Isolation {
    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<Self>()?;
        let mut fields = content.fields()?;
        let isolation = match tag.as_str() {
            "PerfectIsolation" => Self::Perfect,
            "SpecificIsolation" => Self::Specific {
                isolation: fields.required("isolation")?.non_negative()?,
            },
            _ => return Err(content.unknown_variant::<Self>(&tag)),
        };
        fields.finish()?;
        Ok(isolation)
    }

    pub(crate) fn emit(&self) -> Value {
        match self {
            Self::Perfect => Record::new(),
            Self::Specific { isolation } => Record::new().field("isolation", float(*isolation)),
        }
        .tagged(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhaseNoise {
    None,
    /// Power-law oscillator model with white, flicker and random-walk terms.
    Oscillator { k0: f64, k2: f64, k3: f64 },
}

impl Variant for PhaseNoise {
    const EXTENSION_POINT: &'static str = "phase noise";
    const TAGS: &'static [&'static str] = &["NoPhaseNoise", "OscillatorPhaseNoise"];

    fn tag(&self) -> &'static str {
        match self {
            Self::None => "NoPhaseNoise",
            Self::Oscillator { .. } => "OscillatorPhaseNoise",
        }
    }
}

impl PhaseNoise {
    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<Self>()?;
        let mut fields = content.fields()?;
        let noise = match tag.as_str() {
            "NoPhaseNoise" => Self::None,
            "OscillatorPhaseNoise" => Self::Oscillator {
                k0: fields.required("k0")?.non_negative()?,
                k2: fields.required("k2")?.non_negative()?,
                k3: fields.required("k3")?.non_negative()?,
            },
            _ => return Err(content.unknown_variant::<Self>(&tag)),
        };
        fields.finish()?;
        Ok(noise)
    }

    pub(crate) fn emit(&self) -> Value {
        match self {
            Self::None => Record::new(),
            Self::Oscillator { k0, k2, k3 } => Record::new()
                .field("k0", float(*k0))
                .field("k2", float(*k2))
                .field("k3", float(*k3)),
        }
        .tagged(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScenarioError;

    fn parse(text: &str) -> Result<DeviceKind> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        DeviceKind::parse(&Node::root(&value))
    }

    #[test]
    fn parses_simulated_device_with_impairments() {
        let kind = parse(
            "!SimulatedDevice\n\
             carrier_frequency: 60e9\n\
             num_antennas: 4\n\
             position: [0, 1.5, 10]\n\
             isolation: !SpecificIsolation { isolation: 1e-3 }\n\
             phase_noise: !NoPhaseNoise {}\n",
        )
        .unwrap();

        let DeviceKind::Simulated(device) = kind;
        assert_eq!(device.carrier_frequency, 60e9);
        assert_eq!(device.num_antennas, 4);
        assert_eq!(device.position, Some([0.0, 1.5, 10.0]));
        assert_eq!(device.isolation, Some(Isolation::Specific { isolation: 1e-3 }));
        assert_eq!(device.phase_noise, Some(PhaseNoise::None));
    }

    #[test]
    fn carrier_frequency_is_required() {
        let err = parse("!SimulatedDevice { num_antennas: 2 }").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingField { ref field, .. } if field == "carrier_frequency"));
    }

    #[test]
    fn negative_isolation_is_a_type_mismatch() {
        let err = parse(
            "!SimulatedDevice { carrier_frequency: 1e9, isolation: !SpecificIsolation { isolation: -1 } }",
        )
        .unwrap_err();
        match err {
            ScenarioError::TypeMismatch { location, .. } => assert_eq!(location, "isolation.isolation"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_isolation_tag_lists_closed_set() {
        let err = parse("!SimulatedDevice { carrier_frequency: 1e9, isolation: !Magic {} }").unwrap_err();
        match err {
            ScenarioError::Schema { tag, expected, .. } => {
                assert_eq!(tag, "Magic");
                assert_eq!(expected, Isolation::TAGS);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn emitted_device_parses_back_identically() {
        let mut device = SimulatedDevice::new(2.4e9);
        device.phase_noise = Some(PhaseNoise::Oscillator { k0: 1e-10, k2: 0.5, k3: 0.0 });
        let kind = DeviceKind::Simulated(device);
        let emitted = kind.emit();
        assert_eq!(DeviceKind::parse(&Node::root(&emitted)).unwrap(), kind);
    }
}
