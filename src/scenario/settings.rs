use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::document::node::{Node, Record, int};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    None,
    #[default]
    Info,
    All,
}

impl Verbosity {
    const NAMES: &'static [&'static str] = &["none", "info", "all"];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Info => "info",
            Self::All => "all",
        }
    }
}

/// Engine-level settings of the `simulation` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Monte-Carlo drops per grid point.
    pub num_samples: u64,
    pub min_num_samples: Option<u64>,
    pub seed: Option<u64>,
    pub num_workers: Option<u32>,
    pub verbosity: Verbosity,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            num_samples: 100,
            min_num_samples: None,
            seed: None,
            num_workers: None,
            verbosity: Verbosity::Info,
        }
    }
}

impl SimulationSettings {
    pub fn with_num_samples(mut self, num_samples: u64) -> Self {
        self.num_samples = num_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_num_workers(mut self, num_workers: u32) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let mut fields = node.fields()?;
        let mut settings = Self::default();

        if let Some(n) = fields.optional("num_samples") {
            settings.num_samples = n.integer_in("an integer >= 1", |v| v >= 1)?;
        }
        if let Some(n) = fields.optional("min_num_samples") {
            let limit = settings.num_samples;
            settings.min_num_samples = Some(n.integer_in(
                &format!("an integer <= num_samples ({limit})"),
                |v| v <= limit,
            )?);
        }
        if let Some(n) = fields.optional("seed") {
            settings.seed = Some(n.u64()?);
        }
        if let Some(n) = fields.optional("num_workers") {
            settings.num_workers = Some(n.u32_in("an integer >= 1", |v| v >= 1)?);
        }
        if let Some(n) = fields.optional("verbosity") {
            settings.verbosity = match n.keyword(Verbosity::NAMES)? {
                "none" => Verbosity::None,
                "all" => Verbosity::All,
                _ => Verbosity::Info,
            };
        }
        fields.finish()?;
        Ok(settings)
    }

    pub(crate) fn emit(&self) -> Value {
        Record::new()
            .field("num_samples", int(self.num_samples))
            .optional("min_num_samples", self.min_num_samples.map(int))
            .optional("seed", self.seed.map(int))
            .optional("num_workers", self.num_workers.map(|w| int(u64::from(w))))
            .field("verbosity", self.verbosity.name())
            .into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<SimulationSettings> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        SimulationSettings::parse(&Node::root(&value))
    }

    #[test]
    fn defaults_apply_to_missing_fields() {
        let settings = parse("{ seed: 7 }").unwrap();
        assert_eq!(settings, SimulationSettings::default().with_seed(7));
    }

    #[test]
    fn min_samples_bounded_by_samples() {
        assert!(parse("{ num_samples: 10, min_num_samples: 10 }").is_ok());
        assert!(parse("{ num_samples: 10, min_num_samples: 11 }").is_err());
        assert!(parse("{ num_samples: 0 }").is_err());
    }

    #[test]
    fn verbosity_is_a_keyword() {
        assert_eq!(parse("{ verbosity: ALL }").unwrap().verbosity, Verbosity::All);
        assert!(parse("{ verbosity: loud }").is_err());
    }

    #[test]
    fn emitted_settings_parse_back() {
        let settings = SimulationSettings::default()
            .with_num_samples(500)
            .with_num_workers(3)
            .with_verbosity(Verbosity::None);
        let emitted = settings.emit();
        assert_eq!(SimulationSettings::parse(&Node::root(&emitted)).unwrap(), settings);
    }
}
