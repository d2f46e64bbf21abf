use serde::Serialize;
use serde_yaml::Value;

use crate::devices::DeviceId;
use crate::document::node::{Fields, Node, Record, float, floats, int};
use crate::error::Result;
use crate::variants::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(usize);

impl ChannelId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A propagation link between an ordered device pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub alias: Option<String>,
    pub devices: [DeviceId; 2],
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelKind {
    /// Flat channel with a fixed linear gain, `gain: 0` blocks the link.
    Ideal { gain: f64 },
    Radar(RadarChannel),
    TappedDelayLine(TappedDelayLine),
    Cost256(Cost256),
    ClusterDelayLine(ClusterDelayLine),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarChannel {
    /// Metres, `[min, max]`.
    pub target_range: [f64; 2],
    pub radar_cross_section: f64,
    pub target_velocity: f64,
    pub attenuate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TdlModel {
    A,
    B,
    C,
    D,
    E,
}

impl TdlModel {
    const NAMES: &'static [&'static str] = &["A", "B", "C", "D", "E"];

    fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// D and E carry their own line-of-sight component.
    pub fn has_line_of_sight(self) -> bool {
        matches!(self, Self::D | Self::E)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TappedDelayLine {
    pub model_type: TdlModel,
    pub rms_delay: f64,
    pub doppler_frequency: f64,
    pub los_doppler_frequency: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cost256Model {
    Urban,
    Hilly,
    RuralArea,
}

impl Cost256Model {
    const NAMES: &'static [&'static str] = &["URBAN", "HILLY", "RURAL_AREA"];

    fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cost256 {
    pub model_type: Cost256Model,
    pub doppler_frequency: f64,
    pub los_angle: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterDelayLine {
    pub num_clusters: u32,
    pub delay_spread: f64,
    pub delay_scaling: f64,
    pub rice_factor_mean: f64,
    pub rice_factor_std: f64,
    pub cluster_shadowing_std: f64,
}

impl Variant for ChannelKind {
    const EXTENSION_POINT: &'static str = "channel";
    const TAGS: &'static [&'static str] = &[
        "Channel",
        "RadarChannel",
        "5GTDL",
        "COST256",
        "ClusterDelayLine",
    ];

    fn tag(&self) -> &'static str {
        match self {
            Self::Ideal { .. } => "Channel",
            Self::Radar(_) => "RadarChannel",
            Self::TappedDelayLine(_) => "5GTDL",
            Self::Cost256(_) => "COST256",
            Self::ClusterDelayLine(_) => "ClusterDelayLine",
        }
    }
}

impl ChannelKind {
    /// Reads the model specific fields. Common fields (`alias`, `devices`)
    /// must already have been taken from `fields`.
    pub(crate) fn parse(tag: &str, node: &Node, fields: &mut Fields) -> Result<Self> {
        let kind = match tag {
            "Channel" => Self::Ideal {
                gain: match fields.optional("gain") {
                    Some(n) => n.non_negative()?,
                    None => 1.0,
                },
            },
            "RadarChannel" => Self::Radar(RadarChannel {
                target_range: parse_range(&fields.required("target_range")?)?,
                radar_cross_section: fields.required("radar_cross_section")?.positive()?,
                target_velocity: fields.optional("target_velocity").map(|n| n.f64()).transpose()?.unwrap_or(0.0),
                attenuate: fields.optional("attenuate").map(|n| n.bool()).transpose()?.unwrap_or(true),
            }),
            "5GTDL" => {
                let model_type = match fields.required("model_type")?.keyword(TdlModel::NAMES)? {
                    "A" => TdlModel::A,
                    "B" => TdlModel::B,
                    "C" => TdlModel::C,
                    "D" => TdlModel::D,
                    _ => TdlModel::E,
                };
                let rms_delay = non_negative_or_zero(fields, "rms_delay")?;
                let doppler_frequency = non_negative_or_zero(fields, "doppler_frequency")?;
                let los_doppler_frequency = if model_type.has_line_of_sight() {
                    fields.forbid("los_doppler_frequency", "TDL-D and TDL-E fix their line-of-sight Doppler")?;
                    None
                } else {
                    fields.optional("los_doppler_frequency").map(|n| n.f64()).transpose()?
                };
                Self::TappedDelayLine(TappedDelayLine {
                    model_type,
                    rms_delay,
                    doppler_frequency,
                    los_doppler_frequency,
                })
            }
            "COST256" => {
                let model_type = match fields.required("model_type")?.keyword(Cost256Model::NAMES)? {
                    "URBAN" => Cost256Model::Urban,
                    "HILLY" => Cost256Model::Hilly,
                    _ => Cost256Model::RuralArea,
                };
                let doppler_frequency = non_negative_or_zero(fields, "doppler_frequency")?;
                let los_angle = if model_type == Cost256Model::RuralArea {
                    fields.optional("los_angle").map(|n| n.f64()).transpose()?
                } else {
                    fields.forbid("los_angle", "only RURAL_AREA has a line-of-sight path")?;
                    None
                };
                Self::Cost256(Cost256 {
                    model_type,
                    doppler_frequency,
                    los_angle,
                })
            }
            "ClusterDelayLine" => Self::ClusterDelayLine(ClusterDelayLine {
                num_clusters: fields.required("num_clusters")?.u32_in("an integer >= 1", |v| v >= 1)?,
                delay_spread: fields.required("delay_spread")?.non_negative()?,
                delay_scaling: match fields.optional("delay_scaling") {
                    Some(n) => n.number_in("a number >= 1", |v| v >= 1.0)?,
                    None => 1.0,
                },
                rice_factor_mean: non_negative_or_zero(fields, "rice_factor_mean")?,
                rice_factor_std: non_negative_or_zero(fields, "rice_factor_std")?,
                cluster_shadowing_std: non_negative_or_zero(fields, "cluster_shadowing_std")?,
            }),
            _ => return Err(node.unknown_variant::<Self>(tag)),
        };
        Ok(kind)
    }

    pub(crate) fn emit_fields(&self, record: Record) -> Record {
        match self {
            Self::Ideal { gain } => record.field("gain", float(*gain)),
            Self::Radar(radar) => record
                .field("target_range", floats(&radar.target_range))
                .field("radar_cross_section", float(radar.radar_cross_section))
                .field("target_velocity", float(radar.target_velocity))
                .field("attenuate", radar.attenuate),
            Self::TappedDelayLine(tdl) => record
                .field("model_type", tdl.model_type.name())
                .field("rms_delay", float(tdl.rms_delay))
                .field("doppler_frequency", float(tdl.doppler_frequency))
                .optional("los_doppler_frequency", tdl.los_doppler_frequency.map(float)),
            Self::Cost256(cost) => record
                .field("model_type", cost.model_type.name())
                .field("doppler_frequency", float(cost.doppler_frequency))
                .optional("los_angle", cost.los_angle.map(float)),
            Self::ClusterDelayLine(cdl) => record
                .field("num_clusters", int(u64::from(cdl.num_clusters)))
                .field("delay_spread", float(cdl.delay_spread))
                .field("delay_scaling", float(cdl.delay_scaling))
                .field("rice_factor_mean", float(cdl.rice_factor_mean))
                .field("rice_factor_std", float(cdl.rice_factor_std))
                .field("cluster_shadowing_std", float(cdl.cluster_shadowing_std)),
        }
    }

    pub fn is_radar(&self) -> bool {
        matches!(self, Self::Radar(_))
    }
}

fn non_negative_or_zero(fields: &mut Fields, key: &'static str) -> Result<f64> {
    fields.optional(key).map(|n| n.non_negative()).transpose().map(|v| v.unwrap_or(0.0))
}

/// A scalar `r` or an interval `[min, max]` with `0 <= min <= max`.
fn parse_range(node: &Node) -> Result<[f64; 2]> {
    const EXPECTED: &str = "a range r >= 0 or an interval [min, max] with 0 <= min <= max";
    let range = match node.value() {
        Value::Sequence(_) => {
            let items = node.sequence()?;
            if items.len() != 2 {
                return Err(node.mismatch(EXPECTED));
            }
            [items[0].f64()?, items[1].f64()?]
        }
        _ => {
            let r = node.f64().map_err(|_| node.mismatch(EXPECTED))?;
            [r, r]
        }
    };
    if range[0] < 0.0 || range[0] > range[1] {
        return Err(node.mismatch(EXPECTED));
    }
    Ok(range)
}
