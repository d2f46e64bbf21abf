//! First pass: YAML text into drafts whose references are still aliases.

pub(crate) mod anchors;
pub mod emit;
pub(crate) mod node;

use serde_yaml::Value;
use tracing::debug;

use crate::channels::ChannelKind;
use crate::devices::DeviceKind;
use crate::error::{Result, ScenarioError};
use crate::evaluators::{Metric, Statistics};
use crate::operators::{Beamformer, Detector, OperatorRole, Precoding, WaveformConfig};
use crate::scenario::settings::SimulationSettings;
use crate::sweep::{self, Unit};
use crate::variants::Variant;
use anchors::Anchors;
use node::Node;

pub const DEFAULT_SCENARIO_NAME: &str = "scenario";

/// A parsed but unresolved scenario document.
///
/// Holding the complete document before [`Document::resolve`] runs is what
/// allows references to point at entities declared further down.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) name: String,
    pub(crate) settings: SimulationSettings,
    pub(crate) devices: Vec<DraftDevice>,
    pub(crate) channels: Vec<DraftChannel>,
    pub(crate) operators: Vec<DraftOperator>,
    pub(crate) evaluators: Vec<DraftEvaluator>,
    pub(crate) dimensions: Vec<DraftDimension>,
}

/// A reference as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub target: ReferenceTarget,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceTarget {
    Alias(String),
    /// A YAML `*anchor`, holding the location of the anchored node.
    Anchor(String),
    /// A node copy whose anchor is unknown, matched by content.
    Inline(Value),
}

#[derive(Debug, Clone)]
pub(crate) struct DraftDevice {
    pub alias: String,
    pub location: String,
    pub kind: DeviceKind,
    pub source: Value,
}

#[derive(Debug, Clone)]
pub(crate) struct DraftChannel {
    pub alias: Option<String>,
    pub location: String,
    pub devices: [Reference; 2],
    pub kind: ChannelKind,
    pub source: Value,
}

#[derive(Debug, Clone)]
pub(crate) struct DraftOperator {
    pub alias: String,
    pub location: String,
    pub device: Reference,
    pub reference: Option<Reference>,
    pub role: OperatorRole,
    pub waveform: Option<WaveformConfig>,
    pub detector: Option<Detector>,
    pub beamformer: Option<Beamformer>,
    pub precoding: Option<Precoding>,
    pub source: Value,
}

#[derive(Debug, Clone)]
pub(crate) enum DraftSubjects {
    Link {
        transmitting: Reference,
        receiving: Reference,
    },
    Sensing {
        radar: Reference,
        channel: Option<Reference>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct DraftEvaluator {
    pub metric: Metric,
    pub subjects: DraftSubjects,
    pub statistics: Statistics,
}

#[derive(Debug, Clone)]
pub(crate) struct DraftDimension {
    pub path: String,
    pub location: String,
    pub values: Vec<f64>,
    pub unit: Unit,
}

impl Document {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    pub fn num_evaluators(&self) -> usize {
        self.evaluators.len()
    }

    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }
}

/// Parses a scenario document without resolving references.
pub fn parse_document(text: &str) -> Result<Document> {
    let root: Value = serde_yaml::from_str(text)?;
    let anchors = Anchors::scan(text)?;
    debug!("Found {} anchor references", anchors.len());
    parse_with(&root, &anchors)
}

/// Parses an already loaded value. Anchors are gone at this point, so node
/// references fall back to matching declarations by content.
pub(crate) fn parse_value(root: &Value) -> Result<Document> {
    parse_with(root, &Anchors::default())
}

fn parse_with(root: &Value, anchors: &Anchors) -> Result<Document> {
    let root = Node::root(root);
    let mut fields = root.fields()?;

    let name = match fields.optional("name") {
        Some(n) => n.str()?.to_string(),
        None => DEFAULT_SCENARIO_NAME.to_string(),
    };
    let settings = match fields.optional("simulation") {
        Some(n) => SimulationSettings::parse(&n)?,
        None => SimulationSettings::default(),
    };

    let devices = match fields.optional("devices") {
        Some(section) => section
            .entries()?
            .into_iter()
            .map(|(alias, node)| parse_device(alias, &node))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let channels = match fields.optional("channels") {
        Some(section) => section
            .sequence()?
            .iter()
            .map(|node| parse_channel(node, anchors))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let operators = match fields.optional("operators") {
        Some(section) => section
            .entries()?
            .into_iter()
            .map(|(alias, node)| parse_operator(alias, &node, anchors))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let evaluators = match fields.optional("evaluators") {
        Some(section) => section
            .sequence()?
            .iter()
            .map(|node| parse_evaluator(node, anchors))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let dimensions = match fields.optional("dimensions") {
        Some(section) => section
            .entries()?
            .into_iter()
            .map(|(path, node)| parse_dimension(path, &node))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    fields.finish()?;

    debug!(
        "Parsed document {}: {} devices, {} channels, {} operators, {} evaluators, {} dimensions",
        name,
        devices.len(),
        channels.len(),
        operators.len(),
        evaluators.len(),
        dimensions.len()
    );

    Ok(Document {
        name,
        settings,
        devices,
        channels,
        operators,
        evaluators,
        dimensions,
    })
}

fn parse_alias(node: &Node) -> Result<String> {
    let alias = node.str()?;
    if alias.is_empty() || alias.contains('.') {
        return Err(node.mismatch("a non-empty alias without dots"));
    }
    Ok(alias.to_string())
}

fn check_alias(alias: &str, node: &Node) -> Result<()> {
    if alias.is_empty() || alias.contains('.') {
        return Err(ScenarioError::mismatch(
            node.path(),
            "a non-empty alias without dots",
            format!("key \"{alias}\""),
        ));
    }
    Ok(())
}

fn parse_reference(node: &Node, anchors: &Anchors) -> Result<Reference> {
    let target = match node.value() {
        Value::String(alias) => ReferenceTarget::Alias(alias.clone()),
        Value::Tagged(_) => match anchors.target(node.path()) {
            Some(location) => ReferenceTarget::Anchor(location.to_string()),
            None => ReferenceTarget::Inline(node.value().clone()),
        },
        _ => return Err(node.mismatch("an alias")),
    };
    Ok(Reference {
        target,
        location: node.path().to_string(),
    })
}

fn parse_device(alias: &str, node: &Node) -> Result<DraftDevice> {
    check_alias(alias, node)?;
    let kind = DeviceKind::parse(node)?;
    debug!("Device {} at {}", alias, node.path());
    Ok(DraftDevice {
        alias: alias.to_string(),
        location: node.path().to_string(),
        kind,
        source: node.value().clone(),
    })
}

fn parse_channel(node: &Node, anchors: &Anchors) -> Result<DraftChannel> {
    let (tag, content) = node.variant::<ChannelKind>()?;
    let mut fields = content.fields()?;
    let alias = fields.optional("alias").map(|n| parse_alias(&n)).transpose()?;

    let endpoints_node = fields.required("devices")?;
    let endpoints = endpoints_node.sequence()?;
    let [first, second] = endpoints.as_slice() else {
        return Err(endpoints_node.mismatch("exactly two device references"));
    };
    let devices = [parse_reference(first, anchors)?, parse_reference(second, anchors)?];

    let kind = ChannelKind::parse(&tag, &content, &mut fields)?;
    fields.finish()?;
    debug!("Channel {} at {}", tag, node.path());
    Ok(DraftChannel {
        alias,
        location: node.path().to_string(),
        devices,
        kind,
        source: node.value().clone(),
    })
}

fn parse_operator(alias: &str, node: &Node, anchors: &Anchors) -> Result<DraftOperator> {
    check_alias(alias, node)?;
    let (tag, content) = node.variant::<OperatorRole>()?;
    let mut fields = content.fields()?;

    let device = parse_reference(&fields.required("device")?, anchors)?;
    let role = OperatorRole::parse(&tag, &content, &mut fields)?;

    let reference = if role.receives_data() {
        fields
            .optional("reference")
            .map(|n| parse_reference(&n, anchors))
            .transpose()?
    } else {
        fields.forbid("reference", "only receiving operators estimate channels")?;
        None
    };
    let waveform = if role.requires_waveform() {
        Some(WaveformConfig::parse(&fields.required("waveform")?)?)
    } else {
        fields.forbid("waveform", "this operator emits no waveform")?;
        None
    };
    let detector = if role.is_sensing() {
        fields.optional("detector").map(|n| Detector::parse(&n)).transpose()?
    } else {
        fields.forbid("detector", "only sensing operators detect targets")?;
        None
    };
    let beamformer = match fields.optional("beamformer") {
        Some(n) => {
            let beamformer = Beamformer::parse(&n)?;
            if !role.requires_waveform() || (!beamformer.transmits() && !role.receives_data()) {
                return Err(n.mismatch(format!("no !{} on a !{} operator", beamformer.tag(), tag)));
            }
            Some(beamformer)
        }
        None => None,
    };
    let precoding = if role.requires_waveform() {
        fields.optional("precoding").map(|n| Precoding::parse(&n)).transpose()?
    } else {
        fields.forbid("precoding", "this operator emits no symbols")?;
        None
    };
    fields.finish()?;

    debug!("Operator {} ({}) at {}", alias, tag, node.path());
    Ok(DraftOperator {
        alias: alias.to_string(),
        location: node.path().to_string(),
        device,
        reference,
        role,
        waveform,
        detector,
        beamformer,
        precoding,
        source: node.value().clone(),
    })
}

fn parse_evaluator(node: &Node, anchors: &Anchors) -> Result<DraftEvaluator> {
    let (tag, content) = node.variant::<Metric>()?;
    let mut fields = content.fields()?;
    let metric = Metric::parse(&tag, &content, &mut fields)?;

    let subjects = if metric.is_link_metric() {
        DraftSubjects::Link {
            transmitting: parse_reference(&fields.required("transmitting_modem")?, anchors)?,
            receiving: parse_reference(&fields.required("receiving_modem")?, anchors)?,
        }
    } else {
        DraftSubjects::Sensing {
            radar: parse_reference(&fields.required("radar")?, anchors)?,
            channel: fields
                .optional("radar_channel")
                .map(|n| parse_reference(&n, anchors))
                .transpose()?,
        }
    };
    let statistics = Statistics::parse(&mut fields)?;
    fields.finish()?;

    Ok(DraftEvaluator {
        metric,
        subjects,
        statistics,
    })
}

fn parse_dimension(path: &str, node: &Node) -> Result<DraftDimension> {
    if path.is_empty() || path.starts_with('.') || path.ends_with('.') {
        return Err(ScenarioError::mismatch(
            node.path(),
            "a parameter path like `snr` or `alias.parameter`",
            format!("key \"{path}\""),
        ));
    }
    let (values, unit) = sweep::parse_domain(node)?;
    Ok(DraftDimension {
        path: path.to_string(),
        location: node.path().to_string(),
        values,
        unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_parses_to_empty_registries() {
        let document = parse_document("").unwrap();
        assert_eq!(document.name(), DEFAULT_SCENARIO_NAME);
        assert_eq!(document.num_devices(), 0);
        assert_eq!(document.num_dimensions(), 0);
    }

    #[test]
    fn unknown_top_level_section_is_rejected() {
        let err = parse_document("devicez: {}").unwrap_err();
        match err {
            ScenarioError::UnknownField { field, expected, .. } => {
                assert_eq!(field, "devicez");
                assert!(expected.contains(&"devices".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn channel_needs_exactly_two_endpoints() {
        let err = parse_document("channels:\n  - !Channel { devices: [a] }\n").unwrap_err();
        match err {
            ScenarioError::TypeMismatch { location, .. } => assert_eq!(location, "channels[0].devices"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn references_keep_their_location() {
        let document = parse_document(
            "operators:\n  tx: !TransmittingModem\n    device: somewhere\n    waveform: !SC-Rectangular { symbol_rate: 1e6 }\n",
        )
        .unwrap();
        let operator = &document.operators[0];
        assert_eq!(operator.device.location, "operators.tx.device");
        assert_eq!(operator.device.target, ReferenceTarget::Alias("somewhere".to_string()));
    }

    #[test]
    fn silent_transmitter_rejects_waveform() {
        let err = parse_document(
            "operators:\n  quiet: !SilentTransmitter\n    device: a\n    num_samples: 10\n    sampling_rate: 1e6\n    waveform: !SC-Rectangular { symbol_rate: 1e6 }\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::TypeMismatch { ref location, .. } if location == "operators.quiet.waveform"));
    }

    #[test]
    fn detector_only_on_sensing_operators() {
        let err = parse_document(
            "operators:\n  rx: !ReceivingModem\n    device: a\n    waveform: !SC-Rectangular { symbol_rate: 1e6 }\n    detector: !MaxDetector {}\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::TypeMismatch { .. }));
    }

    #[test]
    fn operators_carry_beamforming_and_precoding() {
        let document = parse_document(
            "operators:\n  rx: !ReceivingModem\n    device: a\n    waveform: !SC-Rectangular { symbol_rate: 1e6 }\n    beamformer: !CaponBeamformer { loading: 1e-4 }\n    precoding: !SymbolCoding [!ZF {}]\n",
        )
        .unwrap();
        let operator = &document.operators[0];
        assert_eq!(operator.beamformer, Some(Beamformer::Capon { loading: 1e-4 }));
        assert_eq!(operator.precoding.as_ref().map(|p| p.precoders().len()), Some(1));
    }

    #[test]
    fn capon_cannot_steer_a_transmitter() {
        let err = parse_document(
            "operators:\n  tx: !TransmittingModem\n    device: a\n    waveform: !SC-Rectangular { symbol_rate: 1e6 }\n    beamformer: !CaponBeamformer {}\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::TypeMismatch { ref location, .. } if location == "operators.tx.beamformer"));
    }

    #[test]
    fn silent_transmitter_rejects_precoding() {
        let err = parse_document(
            "operators:\n  quiet: !SilentTransmitter\n    device: a\n    num_samples: 10\n    sampling_rate: 1e6\n    precoding: !SymbolCoding [!ZF {}]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::TypeMismatch { ref location, .. } if location == "operators.quiet.precoding"));
    }

    #[test]
    fn modem_requires_waveform() {
        let err = parse_document("operators:\n  m: !Modem { device: a }\n").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingField { ref field, .. } if field == "waveform"));
    }

    #[test]
    fn dotted_aliases_are_rejected() {
        assert!(parse_document("devices:\n  a.b: !SimulatedDevice { carrier_frequency: 1 }\n").is_err());
    }

    #[test]
    fn syntax_errors_surface_as_yaml_errors() {
        assert!(matches!(parse_document("devices: [unclosed"), Err(ScenarioError::Yaml(_))));
    }
}
