use serde::Serialize;

use crate::channels::ChannelKind;
use crate::devices::{DeviceKind, Isolation, PhaseNoise};
use crate::evaluators::Metric;
use crate::operators::detector::Detector;
use crate::operators::waveform::{ChannelEqualization, ChannelEstimation, PulseShape, Synchronization};
use crate::operators::{Beamformer, OperatorRole, Precoding, SymbolPrecoder};
use crate::sweep::Unit;

/// A closed set of implementations selected by a document tag.
pub trait Variant {
    /// Human readable name of the extension point, used in error messages.
    const EXTENSION_POINT: &'static str;
    /// Every tag the extension point accepts.
    const TAGS: &'static [&'static str];

    fn tag(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub extension_point: &'static str,
    pub tags: &'static [&'static str],
}

impl CatalogEntry {
    fn of<V: Variant>() -> Self {
        Self {
            extension_point: V::EXTENSION_POINT,
            tags: V::TAGS,
        }
    }
}

pub fn catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::of::<DeviceKind>(),
        CatalogEntry::of::<Isolation>(),
        CatalogEntry::of::<PhaseNoise>(),
        CatalogEntry::of::<ChannelKind>(),
        CatalogEntry::of::<OperatorRole>(),
        CatalogEntry::of::<PulseShape>(),
        CatalogEntry::of::<Synchronization>(),
        CatalogEntry::of::<ChannelEstimation>(),
        CatalogEntry::of::<ChannelEqualization>(),
        CatalogEntry::of::<Detector>(),
        CatalogEntry::of::<Beamformer>(),
        CatalogEntry::of::<Precoding>(),
        CatalogEntry::of::<SymbolPrecoder>(),
        CatalogEntry::of::<Metric>(),
        CatalogEntry::of::<Unit>(),
    ]
}

/// Looks up the extension point that accepts `tag`, ignoring ASCII case.
pub fn find(tag: &str) -> Option<CatalogEntry> {
    catalog()
        .into_iter()
        .find(|entry| entry.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_unique_across_extension_points() {
        let mut seen = std::collections::HashSet::new();
        for entry in catalog() {
            for tag in entry.tags {
                assert!(seen.insert(*tag), "tag {tag} listed twice");
            }
        }
    }

    #[test]
    fn find_locates_channel_tags() {
        let entry = find("radarchannel").unwrap();
        assert_eq!(entry.extension_point, ChannelKind::EXTENSION_POINT);
        assert!(find("Nonexistent").is_none());
        assert_eq!(find("zf").unwrap().extension_point, "symbol precoder");
        assert_eq!(find("CaponBeamformer").unwrap().extension_point, "beamformer");
    }
}
