pub mod export;

use serde::Serialize;
use serde_yaml::Value;

use crate::document::node::{Fields, Node, floats, tagged};
use crate::error::Result;
use crate::scenario::EntityRef;
use crate::variants::Variant;

/// Upper bound on the values a single dimension may expand to.
pub const MAX_DIMENSION_POINTS: usize = 1_000_000;

/// Upper bound on the size of the whole sweep grid.
pub const MAX_GRID_POINTS: usize = 1_000_000_000;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Unit {
    #[default]
    Linear,
    #[serde(rename = "dB")]
    Decibel,
}

impl Variant for Unit {
    const EXTENSION_POINT: &'static str = "unit";
    const TAGS: &'static [&'static str] = &["Linear", "dB"];

    fn tag(&self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::Decibel => "dB",
        }
    }
}

impl Unit {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Linear" => Some(Self::Linear),
            "dB" => Some(Self::Decibel),
            _ => None,
        }
    }

    pub fn to_linear(self, value: f64) -> f64 {
        match self {
            Self::Linear => value,
            Self::Decibel => 10f64.powf(value / 10.0),
        }
    }
}

/// What a dimension path points at once aliases are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionTarget {
    /// A parameter owned by the engine itself, e.g. `snr`.
    Engine { parameter: String },
    Entity { entity: EntityRef, parameter: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub path: String,
    pub target: DimensionTarget,
    pub values: Vec<f64>,
    pub unit: Unit,
}

impl Dimension {
    pub fn linear_values(&self) -> Vec<f64> {
        self.values.iter().map(|v| self.unit.to_linear(*v)).collect()
    }

    pub(crate) fn emit(&self) -> Value {
        tagged(self.unit.tag(), floats(&self.values))
    }
}

pub(crate) fn parse_domain(node: &Node) -> Result<(Vec<f64>, Unit)> {
    match node.value() {
        Value::Tagged(_) => {
            let (tag, content) = node.variant::<Unit>()?;
            let unit = Unit::from_tag(&tag).ok_or_else(|| content.unknown_variant::<Unit>(&tag))?;
            let values = match content.value() {
                Value::Mapping(_) => {
                    let mut fields = content.fields()?;
                    let values = values_or_range(&mut fields)?;
                    fields.finish()?;
                    values
                }
                _ => expand(&content)?,
            };
            Ok((values, unit))
        }
        Value::Mapping(_) => {
            let mut fields = node.fields()?;
            let values = values_or_range(&mut fields)?;
            let unit = match fields.optional("unit") {
                Some(n) => match n.keyword(Unit::TAGS)? {
                    "dB" => Unit::Decibel,
                    _ => Unit::Linear,
                },
                None => Unit::Linear,
            };
            fields.finish()?;
            Ok((values, unit))
        }
        _ => Ok((expand(node)?, Unit::Linear)),
    }
}

fn values_or_range(fields: &mut Fields) -> Result<Vec<f64>> {
    if let Some(values) = fields.optional("values") {
        for key in ["start", "stop", "step"] {
            fields.forbid(key, "`values` and a range are exclusive")?;
        }
        return expand(&values);
    }
    let start = fields.required("start")?.f64()?;
    let stop = fields.required("stop")?.f64()?;
    let step_node = fields.required("step")?;
    let step = step_node.f64()?;
    arithmetic_progression(start, step, stop)
        .ok_or_else(|| step_node.mismatch("a non-zero step pointing from start towards stop"))
}

/// Expands an explicit value list, honouring a single `...` placeholder.
///
/// `[a, b, ..., c]` continues the step `b - a` up to and including `c`.
fn expand(node: &Node) -> Result<Vec<f64>> {
    if !matches!(node.value(), Value::Sequence(_)) {
        return Err(node.mismatch("a value sequence"));
    }
    let items = node.sequence()?;
    if items.is_empty() {
        return Err(node.mismatch("at least one value"));
    }

    let ellipses: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.value().as_str() == Some(ELLIPSIS))
        .map(|(index, _)| index)
        .collect();

    match ellipses.as_slice() {
        [] => items.iter().map(|item| item.f64()).collect(),
        [at] => {
            let at = *at;
            if at < 2 || at + 2 != items.len() {
                return Err(items[at].mismatch("`...` between two leading values and one stop value"));
            }
            let head = items[..at].iter().map(|item| item.f64()).collect::<Result<Vec<_>>>()?;
            let stop = items[at + 1].f64()?;
            let last = head[at - 1];
            let step = last - head[at - 2];
            let tail = arithmetic_progression(last, step, stop).ok_or_else(|| {
                items[at + 1].mismatch(format!("a stop value reachable from {last} in steps of {step}"))
            })?;
            let mut values = head[..at - 1].to_vec();
            values.extend(tail);
            Ok(values)
        }
        [_, second, ..] => Err(items[*second].mismatch("at most one `...` per dimension")),
    }
}

/// Inclusive progression `start, start + step, ...` not passing `stop`.
///
/// Returns `None` for a zero step, a step pointing away from `stop`, or a
/// progression longer than [`MAX_DIMENSION_POINTS`].
pub fn arithmetic_progression(start: f64, step: f64, stop: f64) -> Option<Vec<f64>> {
    if !(start.is_finite() && step.is_finite() && stop.is_finite()) {
        return None;
    }
    if start == stop {
        return Some(vec![start]);
    }
    if step == 0.0 {
        return None;
    }
    let span = (stop - start) / step;
    if span < 0.0 {
        return None;
    }
    let count = (span + 1e-9).floor() as usize + 1;
    if count > MAX_DIMENSION_POINTS {
        return None;
    }
    let tolerance = step.abs() * 1e-9;
    Some(
        (0..count)
            .map(|i| {
                let v = start + i as f64 * step;
                if (v - stop).abs() <= tolerance { stop } else { v }
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub index: usize,
    pub coordinates: Vec<usize>,
    pub values: Vec<f64>,
}

/// Cartesian product over dimensions, the last dimension varies fastest.
#[derive(Debug, Clone, Copy)]
pub struct Sweep<'a> {
    dimensions: &'a [Dimension],
}

impl<'a> Sweep<'a> {
    pub fn new(dimensions: &'a [Dimension]) -> Self {
        Self { dimensions }
    }

    pub fn dimensions(&self) -> &'a [Dimension] {
        self.dimensions
    }

    /// Without dimensions the grid is a single point. Saturates instead of
    /// overflowing, resolved scenarios never exceed [`MAX_GRID_POINTS`].
    pub fn num_points(&self) -> usize {
        self.dimensions
            .iter()
            .fold(1usize, |points, d| points.saturating_mul(d.values.len()))
    }

    pub fn point(&self, index: usize) -> Option<GridPoint> {
        if index >= self.num_points() {
            return None;
        }
        let mut remainder = index;
        let mut coordinates = vec![0; self.dimensions.len()];
        for (slot, dimension) in coordinates.iter_mut().zip(self.dimensions).rev() {
            let len = dimension.values.len();
            *slot = remainder % len;
            remainder /= len;
        }
        let values = coordinates
            .iter()
            .zip(self.dimensions)
            .map(|(c, d)| d.values[*c])
            .collect();
        Some(GridPoint {
            index,
            coordinates,
            values,
        })
    }

    pub fn iter(self) -> impl Iterator<Item = GridPoint> + 'a {
        (0..self.num_points()).filter_map(move |index| self.point(index))
    }
}
