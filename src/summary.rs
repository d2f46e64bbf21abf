use serde::Serialize;

use crate::evaluators::Subjects;
use crate::operators::WaveformConfig;
use crate::scenario::{EntityRef, Scenario};
use crate::sweep::DimensionTarget;
use crate::variants::Variant;

/// Flat description of a resolved scenario, written by `show`.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub devices: Vec<DeviceSummary>,
    pub channels: Vec<ChannelSummary>,
    pub operators: Vec<OperatorSummary>,
    pub evaluators: Vec<EvaluatorSummary>,
    pub dimensions: Vec<DimensionSummary>,
    pub grid_points: usize,
    pub num_samples: u64,
    /// Upper bound of Monte-Carlo drops over the whole grid.
    pub total_samples: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub alias: String,
    pub kind: &'static str,
    pub carrier_frequency: f64,
    pub num_antennas: u32,
    pub channels: usize,
    pub operators: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    pub alias: Option<String>,
    pub kind: &'static str,
    pub transmitter: String,
    pub receiver: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperatorSummary {
    pub alias: String,
    pub role: &'static str,
    pub device: String,
    pub reference: Option<String>,
    pub waveform: Option<WaveformSummary>,
    pub beamformer: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaveformSummary {
    pub shape: &'static str,
    pub modulation_order: u32,
    pub bits_per_symbol: u32,
    pub sampling_rate: f64,
    pub samples_in_frame: u64,
    pub frame_duration: f64,
    pub data_bits_per_frame: u64,
    pub data_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluatorSummary {
    pub metric: &'static str,
    pub abbreviation: &'static str,
    pub subjects: Vec<String>,
    pub confidence: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionSummary {
    pub path: String,
    pub target: String,
    pub unit: &'static str,
    pub num_values: usize,
    pub first: f64,
    pub last: f64,
}

impl From<&WaveformConfig> for WaveformSummary {
    fn from(waveform: &WaveformConfig) -> Self {
        Self {
            shape: waveform.shape.tag(),
            modulation_order: waveform.modulation_order,
            bits_per_symbol: waveform.bits_per_symbol(),
            sampling_rate: waveform.sampling_rate(),
            samples_in_frame: waveform.samples_in_frame(),
            frame_duration: waveform.frame_duration(),
            data_bits_per_frame: waveform.num_data_bits_per_frame(),
            data_rate: waveform.data_rate(),
        }
    }
}

impl ScenarioSummary {
    pub fn new(scenario: &Scenario) -> Self {
        let device_alias = |id| scenario.device(id).alias.clone();
        let operator_alias = |id| scenario.operator(id).alias.clone();

        let devices = scenario
            .devices()
            .map(|(id, device)| DeviceSummary {
                alias: device.alias.clone(),
                kind: device.kind.tag(),
                carrier_frequency: device.carrier_frequency(),
                num_antennas: device.num_antennas(),
                channels: scenario.channels_of(id).len(),
                operators: scenario.operators_on(id).len(),
            })
            .collect();

        let channels = scenario
            .channels()
            .map(|(_, channel)| ChannelSummary {
                alias: channel.alias.clone(),
                kind: channel.kind.tag(),
                transmitter: device_alias(channel.devices[0]),
                receiver: device_alias(channel.devices[1]),
            })
            .collect();

        let operators = scenario
            .operators()
            .map(|(_, operator)| OperatorSummary {
                alias: operator.alias.clone(),
                role: operator.role.tag(),
                device: device_alias(operator.device),
                reference: operator.reference.map(device_alias),
                waveform: operator.waveform.as_ref().map(WaveformSummary::from),
                beamformer: operator.beamformer.as_ref().map(|b| b.tag()),
            })
            .collect();

        let evaluators = scenario
            .evaluators()
            .iter()
            .map(|evaluator| EvaluatorSummary {
                metric: evaluator.metric.tag(),
                abbreviation: evaluator.metric.abbreviation(),
                subjects: match evaluator.subjects {
                    Subjects::Link { transmitting, receiving } => {
                        vec![operator_alias(transmitting), operator_alias(receiving)]
                    }
                    Subjects::Sensing { radar, channel } => {
                        let mut subjects = vec![operator_alias(radar)];
                        if let Some(id) = channel {
                            subjects.push(
                                scenario
                                    .channel(id)
                                    .alias
                                    .clone()
                                    .unwrap_or_else(|| format!("channels[{}]", id.index())),
                            );
                        }
                        subjects
                    }
                },
                confidence: evaluator.statistics.confidence,
                tolerance: evaluator.statistics.tolerance,
            })
            .collect();

        let dimensions = scenario
            .dimensions()
            .iter()
            .map(|dimension| DimensionSummary {
                path: dimension.path.clone(),
                target: match &dimension.target {
                    DimensionTarget::Engine { .. } => "engine".to_string(),
                    DimensionTarget::Entity { entity, .. } => target_name(scenario, *entity),
                },
                unit: dimension.unit.tag(),
                num_values: dimension.values.len(),
                first: dimension.values.first().copied().unwrap_or_default(),
                last: dimension.values.last().copied().unwrap_or_default(),
            })
            .collect();

        let grid_points = scenario.sweep().num_points();
        let num_samples = scenario.settings().num_samples;
        Self {
            name: scenario.name().to_string(),
            devices,
            channels,
            operators,
            evaluators,
            dimensions,
            grid_points,
            num_samples,
            total_samples: num_samples.saturating_mul(grid_points as u64),
        }
    }
}

fn target_name(scenario: &Scenario, entity: EntityRef) -> String {
    match scenario.alias_of(entity) {
        Some(alias) => format!("{} {}", entity.kind(), alias),
        None => entity.kind().to_string(),
    }
}
