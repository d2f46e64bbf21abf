pub mod channels;
pub mod devices;
pub mod document;
pub mod error;
pub mod evaluators;
pub mod operators;
pub mod scenario;
pub mod summary;
pub mod sweep;
pub mod variants;

pub use document::{Document, parse_document};
pub use error::{Result, ScenarioError};
pub use scenario::{EntityRef, Scenario, SimulationSettings};
pub use summary::ScenarioSummary;
pub use sweep::{Dimension, Sweep};

pub mod prelude {
    pub use crate::channels::{Channel, ChannelId, ChannelKind};
    pub use crate::devices::{Device, DeviceId, DeviceKind};
    pub use crate::error::{Result, ScenarioError};
    pub use crate::evaluators::{Evaluator, Metric, Subjects};
    pub use crate::operators::{Beamformer, Operator, OperatorId, OperatorRole, Precoding, WaveformConfig};
    pub use crate::scenario::{EntityRef, Scenario, SimulationSettings};
    pub use crate::sweep::{Dimension, DimensionTarget, GridPoint, Sweep, Unit};
    pub use crate::variants::Variant;
}
