use std::collections::HashMap;

use serde_yaml::Value;
use tracing::debug;

use super::{EntityRef, Scenario};
use crate::channels::{Channel, ChannelId};
use crate::devices::{Device, DeviceId};
use crate::document::node::describe;
use crate::document::{
    Document, DraftChannel, DraftDimension, DraftEvaluator, DraftOperator, DraftSubjects, Reference,
    ReferenceTarget,
};
use crate::error::{Result, ScenarioError};
use crate::evaluators::{Evaluator, Subjects};
use crate::operators::{Operator, OperatorId};
use crate::sweep::{Dimension, DimensionTarget, MAX_GRID_POINTS};
use crate::variants::Variant;

impl Document {
    /// Second pass: turns every reference into a handle.
    ///
    /// Pure function of the document, calling it twice yields equal scenarios.
    pub fn resolve(&self) -> Result<Scenario> {
        let resolver = Resolver::new(self)?;

        let devices: Vec<Device> = self
            .devices
            .iter()
            .map(|d| Device {
                alias: d.alias.clone(),
                kind: d.kind.clone(),
            })
            .collect();
        let channels = self
            .channels
            .iter()
            .map(|c| resolver.channel(c))
            .collect::<Result<Vec<_>>>()?;
        let operators = self
            .operators
            .iter()
            .map(|o| resolver.operator(o))
            .collect::<Result<Vec<_>>>()?;
        let evaluators = self
            .evaluators
            .iter()
            .map(|e| resolver.evaluator(e, &channels, &operators))
            .collect::<Result<Vec<_>>>()?;
        let dimensions = self
            .dimensions
            .iter()
            .map(|d| resolver.dimension(d))
            .collect::<Result<Vec<_>>>()?;
        check_grid_size(&self.dimensions)?;

        debug!(
            "Resolved {} aliases for scenario {}",
            resolver.aliases.len(),
            self.name
        );

        Ok(Scenario {
            name: self.name.clone(),
            settings: self.settings.clone(),
            devices,
            channels,
            operators,
            evaluators,
            dimensions,
        })
    }
}

struct Resolver<'d> {
    document: &'d Document,
    aliases: HashMap<&'d str, (EntityRef, &'d str)>, // alias -> (entity, declared at)
}

impl<'d> Resolver<'d> {
    fn new(document: &'d Document) -> Result<Self> {
        let mut resolver = Self {
            document,
            aliases: HashMap::new(),
        };
        for (index, device) in document.devices.iter().enumerate() {
            resolver.declare(&device.alias, EntityRef::Device(DeviceId::new(index)), &device.location)?;
        }
        for (index, channel) in document.channels.iter().enumerate() {
            if let Some(alias) = &channel.alias {
                resolver.declare(alias, EntityRef::Channel(ChannelId::new(index)), &channel.location)?;
            }
        }
        for (index, operator) in document.operators.iter().enumerate() {
            resolver.declare(&operator.alias, EntityRef::Operator(OperatorId::new(index)), &operator.location)?;
        }
        Ok(resolver)
    }

    fn declare(&mut self, alias: &'d str, entity: EntityRef, location: &'d str) -> Result<()> {
        if let Some((_, first)) = self.aliases.get(alias) {
            return Err(ScenarioError::DuplicateAlias {
                alias: alias.to_string(),
                first: first.to_string(),
                second: location.to_string(),
            });
        }
        self.aliases.insert(alias, (entity, location));
        Ok(())
    }

    /// Resolves a reference to an entity of one kind.
    ///
    /// Anchors resolve to the declaration at the anchored location. Node
    /// copies without anchor information resolve to the single declaration
    /// they are structurally equal to.
    fn entity<'s, T>(
        &self,
        reference: &Reference,
        kind: &'static str,
        declarations: impl Iterator<Item = (&'s str, &'s Value)>,
        pick: impl Fn(EntityRef) -> Option<T>,
        handle: impl Fn(usize) -> T,
    ) -> Result<T> {
        match &reference.target {
            ReferenceTarget::Alias(alias) => match self.aliases.get(alias.as_str()) {
                Some((entity, _)) => pick(*entity).ok_or_else(|| {
                    ScenarioError::mismatch(
                        &reference.location,
                        format!("a {kind} alias"),
                        format!("{} alias `{alias}`", entity.kind()),
                    )
                }),
                None => Err(ScenarioError::UnresolvedReference {
                    location: reference.location.clone(),
                    kind,
                    alias: alias.clone(),
                }),
            },
            ReferenceTarget::Anchor(anchored) => declarations
                .map(|(location, _)| location)
                .position(|location| location == anchored.as_str())
                .map(handle)
                .ok_or_else(|| {
                    ScenarioError::mismatch(
                        &reference.location,
                        format!("an anchored {kind} declaration"),
                        format!("anchor on `{anchored}`"),
                    )
                }),
            ReferenceTarget::Inline(value) => {
                let matches: Vec<usize> = declarations
                    .enumerate()
                    .filter(|(_, (_, source))| *source == value)
                    .map(|(index, _)| index)
                    .collect();
                match matches.as_slice() {
                    [index] => Ok(handle(*index)),
                    [] => Err(ScenarioError::UnresolvedReference {
                        location: reference.location.clone(),
                        kind,
                        alias: format!("<inline {}>", describe(value)),
                    }),
                    _ => Err(ScenarioError::mismatch(
                        &reference.location,
                        format!("a node identifying a single {kind}"),
                        format!("{} identical {kind} declarations", matches.len()),
                    )),
                }
            }
        }
    }

    fn device(&self, reference: &Reference) -> Result<DeviceId> {
        self.entity(
            reference,
            "device",
            self.document.devices.iter().map(|d| (d.location.as_str(), &d.source)),
            |entity| match entity {
                EntityRef::Device(id) => Some(id),
                _ => None,
            },
            DeviceId::new,
        )
    }

    fn channel_ref(&self, reference: &Reference) -> Result<ChannelId> {
        self.entity(
            reference,
            "channel",
            self.document.channels.iter().map(|c| (c.location.as_str(), &c.source)),
            |entity| match entity {
                EntityRef::Channel(id) => Some(id),
                _ => None,
            },
            ChannelId::new,
        )
    }

    fn operator_ref(&self, reference: &Reference) -> Result<OperatorId> {
        self.entity(
            reference,
            "operator",
            self.document.operators.iter().map(|o| (o.location.as_str(), &o.source)),
            |entity| match entity {
                EntityRef::Operator(id) => Some(id),
                _ => None,
            },
            OperatorId::new,
        )
    }

    fn channel(&self, draft: &DraftChannel) -> Result<Channel> {
        let [transmitter, receiver] = &draft.devices;
        Ok(Channel {
            alias: draft.alias.clone(),
            devices: [self.device(transmitter)?, self.device(receiver)?],
            kind: draft.kind.clone(),
        })
    }

    fn operator(&self, draft: &DraftOperator) -> Result<Operator> {
        Ok(Operator {
            alias: draft.alias.clone(),
            device: self.device(&draft.device)?,
            role: draft.role.clone(),
            reference: draft.reference.as_ref().map(|r| self.device(r)).transpose()?,
            waveform: draft.waveform.clone(),
            detector: draft.detector.clone(),
            beamformer: draft.beamformer.clone(),
            precoding: draft.precoding.clone(),
        })
    }

    fn evaluator(&self, draft: &DraftEvaluator, channels: &[Channel], operators: &[Operator]) -> Result<Evaluator> {
        let subjects = match &draft.subjects {
            DraftSubjects::Link { transmitting, receiving } => {
                let tx = self.operator_ref(transmitting)?;
                let rx = self.operator_ref(receiving)?;
                expect_role(transmitting, &operators[tx.index()], "an operator that transmits data", |o| {
                    o.role.transmits_data()
                })?;
                expect_role(receiving, &operators[rx.index()], "an operator that receives data", |o| {
                    o.role.receives_data()
                })?;
                Subjects::Link {
                    transmitting: tx,
                    receiving: rx,
                }
            }
            DraftSubjects::Sensing { radar, channel } => {
                let radar_id = self.operator_ref(radar)?;
                expect_role(radar, &operators[radar_id.index()], "a sensing operator", |o| {
                    o.role.is_sensing()
                })?;
                let channel = match channel {
                    Some(reference) => {
                        let id = self.channel_ref(reference)?;
                        let kind = &channels[id.index()].kind;
                        if !kind.is_radar() {
                            return Err(ScenarioError::mismatch(
                                &reference.location,
                                "a RadarChannel",
                                format!("a channel tagged !{}", kind.tag()),
                            ));
                        }
                        Some(id)
                    }
                    None => None,
                };
                Subjects::Sensing {
                    radar: radar_id,
                    channel,
                }
            }
        };
        Ok(Evaluator {
            metric: draft.metric.clone(),
            subjects,
            statistics: draft.statistics.clone(),
        })
    }

    fn dimension(&self, draft: &DraftDimension) -> Result<Dimension> {
        let target = match draft.path.split_once('.') {
            None => DimensionTarget::Engine {
                parameter: draft.path.clone(),
            },
            Some((alias, parameter)) => match self.aliases.get(alias) {
                Some((entity, _)) => DimensionTarget::Entity {
                    entity: *entity,
                    parameter: parameter.to_string(),
                },
                None => {
                    return Err(ScenarioError::UnresolvedReference {
                        location: draft.location.clone(),
                        kind: "entity",
                        alias: alias.to_string(),
                    });
                }
            },
        };
        Ok(Dimension {
            path: draft.path.clone(),
            target,
            values: draft.values.clone(),
            unit: draft.unit,
        })
    }
}

fn check_grid_size(dimensions: &[DraftDimension]) -> Result<()> {
    let mut points = 1usize;
    for dimension in dimensions {
        points = points
            .checked_mul(dimension.values.len())
            .filter(|points| *points <= MAX_GRID_POINTS)
            .ok_or_else(|| {
                ScenarioError::mismatch(
                    &dimension.location,
                    format!("a sweep grid of at most {MAX_GRID_POINTS} points"),
                    format!("{} values multiplying a grid of {points} points", dimension.values.len()),
                )
            })?;
    }
    Ok(())
}

fn expect_role(
    reference: &Reference,
    operator: &Operator,
    expected: &str,
    accept: impl Fn(&Operator) -> bool,
) -> Result<()> {
    if accept(operator) {
        Ok(())
    } else {
        Err(ScenarioError::mismatch(
            &reference.location,
            expected,
            format!("operator `{}` tagged !{}", operator.alias, operator.role.tag()),
        ))
    }
}
