//! Resolved scenario back to its document form.
//!
//! References are written as aliases. A channel declared without alias is
//! referenced by an inline copy of its node, which the resolver maps back
//! to the same declaration.

use serde_yaml::{Mapping, Value};

use super::node::Record;
use crate::channels::Channel;
use crate::devices::DeviceId;
use crate::evaluators::{Evaluator, Subjects};
use crate::operators::{Operator, OperatorId};
use crate::scenario::Scenario;
use crate::variants::Variant;

pub(crate) fn scenario(scenario: &Scenario) -> Value {
    let devices: Mapping = scenario
        .devices
        .iter()
        .map(|d| (Value::String(d.alias.clone()), d.kind.emit()))
        .collect();
    let operators: Mapping = scenario
        .operators
        .iter()
        .map(|o| (Value::String(o.alias.clone()), operator(scenario, o)))
        .collect();
    let dimensions: Mapping = scenario
        .dimensions
        .iter()
        .map(|d| (Value::String(d.path.clone()), d.emit()))
        .collect();

    Record::new()
        .field("name", scenario.name.as_str())
        .field("simulation", scenario.settings.emit())
        .field("devices", devices)
        .field(
            "channels",
            scenario.channels.iter().map(|c| channel(scenario, c)).collect::<Vec<_>>(),
        )
        .field("operators", operators)
        .field(
            "evaluators",
            scenario.evaluators.iter().map(|e| evaluator(scenario, e)).collect::<Vec<_>>(),
        )
        .field("dimensions", dimensions)
        .into_value()
}

fn device_alias(scenario: &Scenario, id: DeviceId) -> Value {
    Value::String(scenario.device(id).alias.clone())
}

fn operator_alias(scenario: &Scenario, id: OperatorId) -> Value {
    Value::String(scenario.operator(id).alias.clone())
}

fn channel(scenario: &Scenario, channel: &Channel) -> Value {
    let [transmitter, receiver] = channel.devices;
    let record = Record::new().optional("alias", channel.alias.as_deref()).field(
        "devices",
        vec![device_alias(scenario, transmitter), device_alias(scenario, receiver)],
    );
    channel.kind.emit_fields(record).tagged(channel.kind.tag())
}

fn operator(scenario: &Scenario, operator: &Operator) -> Value {
    let record = Record::new()
        .field("device", device_alias(scenario, operator.device))
        .optional("reference", operator.reference.map(|r| device_alias(scenario, r)));
    operator
        .role
        .emit_fields(record)
        .optional("waveform", operator.waveform.as_ref().map(|w| w.emit()))
        .optional("detector", operator.detector.as_ref().map(|d| d.emit()))
        .optional("beamformer", operator.beamformer.as_ref().map(|b| b.emit()))
        .optional("precoding", operator.precoding.as_ref().map(|p| p.emit()))
        .tagged(operator.role.tag())
}

fn evaluator(scenario: &Scenario, evaluator: &Evaluator) -> Value {
    let record = match evaluator.subjects {
        Subjects::Link { transmitting, receiving } => Record::new()
            .field("transmitting_modem", operator_alias(scenario, transmitting))
            .field("receiving_modem", operator_alias(scenario, receiving)),
        Subjects::Sensing { radar, channel: radar_channel } => Record::new()
            .field("radar", operator_alias(scenario, radar))
            .optional(
                "radar_channel",
                radar_channel.map(|id| {
                    let target = scenario.channel(id);
                    match &target.alias {
                        Some(alias) => Value::String(alias.clone()),
                        None => channel(scenario, target),
                    }
                }),
            ),
    };
    let record = evaluator.metric.emit_fields(record);
    evaluator.statistics.emit_fields(record).tagged(evaluator.metric.tag())
}

#[cfg(test)]
mod tests {
    use crate::scenario::Scenario;

    #[test]
    fn unaliased_radar_channel_survives_round_trip() {
        let text = "
devices:
  bs: !SimulatedDevice { carrier_frequency: 60e9 }
channels:
  - &target !RadarChannel { devices: [bs, bs], target_range: [5, 20], radar_cross_section: 2 }
operators:
  radar: !MatchedFilterJcas
    device: bs
    max_range: 30
    waveform: !SC-RaisedCosine { symbol_rate: 1e8 }
evaluators:
  - !ReceiverOperatingCharacteristic { radar: radar, radar_channel: *target }
";
        let scenario = Scenario::from_yaml(text).unwrap();
        let yaml = scenario.to_yaml().unwrap();
        assert_eq!(Scenario::from_yaml(&yaml).unwrap(), scenario);
    }
}
