use serde::Serialize;
use serde_yaml::Value;

use crate::document::node::{Node, Record, float, int};
use crate::error::Result;
use crate::variants::Variant;

/// Single-carrier waveform parameters shared by all pulse shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformConfig {
    pub shape: PulseShape,
    /// Symbols per second.
    pub symbol_rate: f64,
    pub modulation_order: u32,
    pub oversampling_factor: u32,
    pub num_preamble_symbols: u32,
    pub num_data_symbols: u32,
    /// One pilot symbol follows every `pilot_rate` data symbols, zero disables pilots.
    pub pilot_rate: u32,
    /// Seconds.
    pub guard_interval: f64,
    pub synchronization: Option<Synchronization>,
    pub channel_estimation: Option<ChannelEstimation>,
    pub channel_equalization: Option<ChannelEqualization>,
}

impl WaveformConfig {
    pub fn new(shape: PulseShape, symbol_rate: f64) -> Self {
        Self {
            shape,
            symbol_rate,
            modulation_order: 16,
            oversampling_factor: 1,
            num_preamble_symbols: 0,
            num_data_symbols: 100,
            pilot_rate: 0,
            guard_interval: 0.0,
            synchronization: None,
            channel_estimation: None,
            channel_equalization: None,
        }
    }

    pub fn bits_per_symbol(&self) -> u32 {
        self.modulation_order.trailing_zeros()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.symbol_rate * f64::from(self.oversampling_factor)
    }

    pub fn num_pilot_symbols(&self) -> u32 {
        if self.pilot_rate == 0 {
            0
        } else {
            self.num_data_symbols / self.pilot_rate
        }
    }

    pub fn samples_in_frame(&self) -> u64 {
        let symbols = u64::from(self.num_preamble_symbols)
            + u64::from(self.num_data_symbols)
            + u64::from(self.num_pilot_symbols());
        let guard_samples = (self.guard_interval * self.sampling_rate()).round() as u64;
        symbols * u64::from(self.oversampling_factor) + guard_samples
    }

    /// Seconds.
    pub fn frame_duration(&self) -> f64 {
        self.samples_in_frame() as f64 / self.sampling_rate()
    }

    pub fn num_data_bits_per_frame(&self) -> u64 {
        u64::from(self.num_data_symbols) * u64::from(self.bits_per_symbol())
    }

    /// Throughput in bit/s when every frame is received without error.
    pub fn data_rate(&self) -> f64 {
        self.num_data_bits_per_frame() as f64 / self.frame_duration()
    }

    pub(crate) fn parse(node: &Node) -> Result<Self> {
        let (tag, content) = node.variant::<PulseShape>()?;
        let mut fields = content.fields()?;
        let shape = match tag.as_str() {
            "SC-Rectangular" => PulseShape::Rectangular,
            "SC-RaisedCosine" | "SC-RootRaisedCosine" => {
                let roll_off = match fields.optional("roll_off") {
                    Some(n) => n.number_in("a roll-off factor in [0, 1]", |v| (0.0..=1.0).contains(&v))?,
                    None => PulseShape::DEFAULT_ROLL_OFF,
                };
                if tag == "SC-RaisedCosine" {
                    PulseShape::RaisedCosine { roll_off }
                } else {
                    PulseShape::RootRaisedCosine { roll_off }
                }
            }
            "SC-Gaussian" => PulseShape::Gaussian {
                bandwidth_time_product: match fields.optional("bandwidth_time_product") {
                    Some(n) => n.positive()?,
                    None => PulseShape::DEFAULT_BANDWIDTH_TIME_PRODUCT,
                },
            },
            _ => return Err(content.unknown_variant::<PulseShape>(&tag)),
        };

        let mut waveform = Self::new(shape, fields.required("symbol_rate")?.positive()?);
        if let Some(n) = fields.optional("modulation_order") {
            waveform.modulation_order = n.u32_in("a positive power of two", u32::is_power_of_two)?;
        }
        if let Some(n) = fields.optional("oversampling_factor") {
            waveform.oversampling_factor = n.u32_in("an integer >= 1", |v| v >= 1)?;
        }
        if let Some(n) = fields.optional("num_preamble_symbols") {
            waveform.num_preamble_symbols = n.u32_in("a non-negative integer", |_| true)?;
        }
        if let Some(n) = fields.optional("num_data_symbols") {
            waveform.num_data_symbols = n.u32_in("an integer >= 1", |v| v >= 1)?;
        }
        if let Some(n) = fields.optional("pilot_rate") {
            waveform.pilot_rate = n.u32_in("a non-negative integer", |_| true)?;
        }
        if let Some(n) = fields.optional("guard_interval") {
            waveform.guard_interval = n.non_negative()?;
        }
        waveform.synchronization = fields
            .optional("synchronization")
            .map(|n| Synchronization::parse(&n))
            .transpose()?;
        waveform.channel_estimation = fields
            .optional("channel_estimation")
            .map(|n| ChannelEstimation::parse(&n))
            .transpose()?;
        waveform.channel_equalization = fields
            .optional("channel_equalization")
            .map(|n| ChannelEqualization::parse(&n))
            .transpose()?;
        fields.finish()?;
        Ok(waveform)
    }

    pub(crate) fn emit(&self) -> Value {
        let record = match self.shape {
            PulseShape::Rectangular => Record::new(),
            PulseShape::RaisedCosine { roll_off } | PulseShape::RootRaisedCosine { roll_off } => {
                Record::new().field("roll_off", float(roll_off))
            }
            PulseShape::Gaussian { bandwidth_time_product } => {
                Record::new().field("bandwidth_time_product", float(bandwidth_time_product))
            }
        };
        record
            .field("symbol_rate", float(self.symbol_rate))
            .field("modulation_order", int(u64::from(self.modulation_order)))
            .field("oversampling_factor", int(u64::from(self.oversampling_factor)))
            .field("num_preamble_symbols", int(u64::from(self.num_preamble_symbols)))
            .field("num_data_symbols", int(u64::from(self.num_data_symbols)))
            .field("pilot_rate", int(u64::from(self.pilot_rate)))
            .field("guard_interval", float(self.guard_interval))
            .optional("synchronization", self.synchronization.map(|s| unit_variant(s.tag())))
            .optional("channel_estimation", self.channel_estimation.map(|e| unit_variant(e.tag())))
            .optional("channel_equalization", self.channel_equalization.map(|e| unit_variant(e.tag())))
            .tagged(self.shape.tag())
    }
}

fn unit_variant(tag: &str) -> Value {
    Record::new().tagged(tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PulseShape {
    Rectangular,
    RaisedCosine { roll_off: f64 },
    RootRaisedCosine { roll_off: f64 },
    Gaussian { bandwidth_time_product: f64 },
}

impl PulseShape {
    pub const DEFAULT_ROLL_OFF: f64 = 0.22;
    pub const DEFAULT_BANDWIDTH_TIME_PRODUCT: f64 = 0.5;
}

impl Variant for PulseShape {
    const EXTENSION_POINT: &'static str = "waveform";
    const TAGS: &'static [&'static str] = &[
        "SC-Rectangular",
        "SC-RaisedCosine",
        "SC-RootRaisedCosine",
        "SC-Gaussian",
    ];

    fn tag(&self) -> &'static str {
        match self {
            Self::Rectangular => "SC-Rectangular",
            Self::RaisedCosine { .. } => "SC-RaisedCosine",
            Self::RootRaisedCosine { .. } => "SC-RootRaisedCosine",
            Self::Gaussian { .. } => "SC-Gaussian",
        }
    }
}

// Algorithm selections below carry no parameters, the tag is the whole config.
macro_rules! unit_variants {
    ($name:ident, $point:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl Variant for $name {
            const EXTENSION_POINT: &'static str = $point;
            const TAGS: &'static [&'static str] = &[$($tag),+];

            fn tag(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag),+
                }
            }
        }

        impl $name {
            pub(crate) fn parse(node: &Node) -> Result<Self> {
                let (tag, content) = node.variant::<Self>()?;
                let selected = match tag.as_str() {
                    $($tag => Self::$variant,)+
                    _ => return Err(content.unknown_variant::<Self>(&tag)),
                };
                content.fields()?.finish()?;
                Ok(selected)
            }
        }
    };
}

unit_variants!(Synchronization, "synchronization", {
    Correlation => "SC-Correlation",
});

unit_variants!(ChannelEstimation, "channel estimation", {
    LeastSquares => "SC-LeastSquares",
    Ideal => "SC-Ideal",
});

unit_variants!(ChannelEqualization, "channel equalization", {
    ZeroForcing => "SC-ZeroForcing",
    MinimumMeanSquareError => "SC-MinimumMeanSquareError",
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScenarioError;

    fn parse(text: &str) -> Result<WaveformConfig> {
        let value: Value = serde_yaml::from_str(text).unwrap();
        WaveformConfig::parse(&Node::root(&value))
    }

    #[test]
    fn defaults_fill_the_frame_structure() {
        let waveform = parse("!SC-Rectangular { symbol_rate: 1e6 }").unwrap();
        assert_eq!(waveform.modulation_order, 16);
        assert_eq!(waveform.oversampling_factor, 1);
        assert_eq!(waveform.num_data_symbols, 100);
        assert_eq!(waveform.bits_per_symbol(), 4);
        assert_eq!(waveform.num_data_bits_per_frame(), 400);
    }

    #[test]
    fn frame_figures_include_pilots_and_guard() {
        let waveform = parse(
            "!SC-RootRaisedCosine\n\
             symbol_rate: 1e6\n\
             oversampling_factor: 4\n\
             modulation_order: 4\n\
             num_preamble_symbols: 10\n\
             num_data_symbols: 100\n\
             pilot_rate: 10\n\
             guard_interval: 1e-5\n\
             channel_estimation: !SC-LeastSquares {}\n\
             channel_equalization: !SC-ZeroForcing {}\n",
        )
        .unwrap();

        assert_eq!(waveform.shape, PulseShape::RootRaisedCosine { roll_off: 0.22 });
        assert_eq!(waveform.num_pilot_symbols(), 10);
        assert_eq!(waveform.sampling_rate(), 4e6);
        // (10 + 100 + 10) symbols * 4 + 40 guard samples
        assert_eq!(waveform.samples_in_frame(), 520);
        assert!((waveform.frame_duration() - 130e-6).abs() < 1e-12);
        assert_eq!(waveform.channel_estimation, Some(ChannelEstimation::LeastSquares));
        assert_eq!(waveform.channel_equalization, Some(ChannelEqualization::ZeroForcing));
    }

    #[test]
    fn modulation_order_must_be_power_of_two() {
        let err = parse("!SC-Rectangular { symbol_rate: 1e6, modulation_order: 6 }").unwrap_err();
        match err {
            ScenarioError::TypeMismatch { location, expected, .. } => {
                assert_eq!(location, "modulation_order");
                assert_eq!(expected, "a positive power of two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn roll_off_out_of_range_is_rejected() {
        assert!(parse("!SC-RaisedCosine { symbol_rate: 1e6, roll_off: 1.5 }").is_err());
    }

    #[test]
    fn estimation_tag_must_come_from_closed_set() {
        let err = parse("!SC-Rectangular { symbol_rate: 1e6, channel_estimation: !SC-Guess {} }").unwrap_err();
        assert!(matches!(err, ScenarioError::Schema { extension_point: "channel estimation", .. }));
    }

    #[test]
    fn waveform_emits_and_parses_back() {
        let mut waveform = WaveformConfig::new(PulseShape::Gaussian { bandwidth_time_product: 0.3 }, 2e6);
        waveform.synchronization = Some(Synchronization::Correlation);
        waveform.channel_equalization = Some(ChannelEqualization::MinimumMeanSquareError);
        let emitted = waveform.emit();
        assert_eq!(WaveformConfig::parse(&Node::root(&emitted)).unwrap(), waveform);
    }
}
