//! The resolved entity graph handed to a simulation engine.

mod resolve;
pub mod settings;

pub use settings::{SimulationSettings, Verbosity};

use std::fs;
use std::path::Path;

use serde_yaml::Value;
use tracing::{info, warn};

use crate::channels::{Channel, ChannelId};
use crate::devices::{Device, DeviceId};
use crate::document::{self, emit};
use crate::error::{Result, ScenarioError};
use crate::evaluators::Evaluator;
use crate::operators::{Operator, OperatorId};
use crate::summary::ScenarioSummary;
use crate::sweep::{Dimension, Sweep};

/// Handle to any aliased entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Device(DeviceId),
    Channel(ChannelId),
    Operator(OperatorId),
}

impl EntityRef {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Device(_) => "device",
            Self::Channel(_) => "channel",
            Self::Operator(_) => "operator",
        }
    }
}

/// A fully resolved scenario.
///
/// Entities live in arenas and refer to each other through typed handles, so
/// two channels naming the same device alias share one [`DeviceId`]. Handles
/// are only meaningful for the scenario that issued them; indexing with a
/// foreign handle panics like any out of bounds slice access.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub(crate) name: String,
    pub(crate) settings: SimulationSettings,
    pub(crate) devices: Vec<Device>,
    pub(crate) channels: Vec<Channel>,
    pub(crate) operators: Vec<Operator>,
    pub(crate) evaluators: Vec<Evaluator>,
    pub(crate) dimensions: Vec<Dimension>,
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        document::parse_document(text)?.resolve()
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        document::parse_value(value)?.resolve()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading scenario from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_yaml(&text)?;
        info!(
            "Loaded scenario {}: {} devices, {} channels, {} operators, {} evaluators, {} grid points",
            scenario.name,
            scenario.devices.len(),
            scenario.channels.len(),
            scenario.operators.len(),
            scenario.evaluators.len(),
            scenario.sweep().num_points()
        );
        Ok(scenario)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.index()]
    }

    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.devices.iter().enumerate().map(|(i, d)| (DeviceId::new(i), d))
    }

    pub fn device_id(&self, alias: &str) -> Option<DeviceId> {
        self.devices.iter().position(|d| d.alias == alias).map(DeviceId::new)
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    pub fn channels(&self) -> impl Iterator<Item = (ChannelId, &Channel)> {
        self.channels.iter().enumerate().map(|(i, c)| (ChannelId::new(i), c))
    }

    pub fn channel_id(&self, alias: &str) -> Option<ChannelId> {
        self.channels
            .iter()
            .position(|c| c.alias.as_deref() == Some(alias))
            .map(ChannelId::new)
    }

    pub fn operator(&self, id: OperatorId) -> &Operator {
        &self.operators[id.index()]
    }

    pub fn operators(&self) -> impl Iterator<Item = (OperatorId, &Operator)> {
        self.operators.iter().enumerate().map(|(i, o)| (OperatorId::new(i), o))
    }

    pub fn operator_id(&self, alias: &str) -> Option<OperatorId> {
        self.operators.iter().position(|o| o.alias == alias).map(OperatorId::new)
    }

    pub fn lookup(&self, alias: &str) -> Option<EntityRef> {
        self.device_id(alias)
            .map(EntityRef::Device)
            .or_else(|| self.channel_id(alias).map(EntityRef::Channel))
            .or_else(|| self.operator_id(alias).map(EntityRef::Operator))
    }

    /// Alias of an entity, `None` only for channels declared without one.
    pub fn alias_of(&self, entity: EntityRef) -> Option<&str> {
        match entity {
            EntityRef::Device(id) => Some(&self.device(id).alias),
            EntityRef::Channel(id) => self.channel(id).alias.as_deref(),
            EntityRef::Operator(id) => Some(&self.operator(id).alias),
        }
    }

    pub fn evaluators(&self) -> &[Evaluator] {
        &self.evaluators
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn sweep(&self) -> Sweep<'_> {
        Sweep::new(&self.dimensions)
    }

    pub fn channels_of(&self, device: DeviceId) -> Vec<ChannelId> {
        self.channels()
            .filter(|(_, c)| c.devices.contains(&device))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn operators_on(&self, device: DeviceId) -> Vec<OperatorId> {
        self.operators()
            .filter(|(_, o)| o.device == device)
            .map(|(id, _)| id)
            .collect()
    }

    /// Devices no channel endpoint, operator binding or reference points at.
    pub fn unused_devices(&self) -> Vec<DeviceId> {
        let unused: Vec<DeviceId> = self
            .devices()
            .map(|(id, _)| id)
            .filter(|id| {
                !self.channels.iter().any(|c| c.devices.contains(id))
                    && !self
                        .operators
                        .iter()
                        .any(|o| o.device == *id || o.reference == Some(*id))
            })
            .collect();
        for id in &unused {
            warn!("Device {} is not used by any channel or operator", self.device(*id).alias);
        }
        unused
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary::new(self)
    }

    /// Document form of the scenario. Parsing it again yields an equal scenario.
    pub fn to_value(&self) -> Value {
        emit::scenario(self)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }
}
