//! Upstream addon families.

use crate::types::ServiceId;

pub mod jackettio;
pub mod mediafusion;

pub use jackettio::get_jackettio_streams;
pub use mediafusion::get_mediafusion_streams;

/// Closed set of addon families the aggregator can query.
///
/// Parse and rewrite specializations dispatch on this tag, so adding a
/// family means adding a variant and its match arms rather than a new
/// inheritance layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonKind {
    MediaFusion,
    Jackettio,
}

impl AddonKind {
    /// Family default display name, used unless the caller overrides it.
    pub fn default_name(self) -> &'static str {
        match self {
            AddonKind::MediaFusion => "MediaFusion",
            AddonKind::Jackettio => "Jackettio",
        }
    }

    /// Services this family can resolve streams through.
    pub fn supported_services(self) -> &'static [ServiceId] {
        match self {
            AddonKind::MediaFusion => &[
                ServiceId::RealDebrid,
                ServiceId::AllDebrid,
                ServiceId::Premiumize,
                ServiceId::DebridLink,
                ServiceId::Torbox,
                ServiceId::Offcloud,
                ServiceId::PikPak,
                ServiceId::Seedr,
                ServiceId::Easynews,
                ServiceId::Putio,
            ],
            AddonKind::Jackettio => &[
                ServiceId::RealDebrid,
                ServiceId::AllDebrid,
                ServiceId::Premiumize,
                ServiceId::DebridLink,
                ServiceId::Torbox,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mediafusion_supports_every_service() {
        let supported = AddonKind::MediaFusion.supported_services();
        assert_eq!(supported.len(), 10);
        assert!(supported.contains(&ServiceId::PikPak));
        assert!(supported.contains(&ServiceId::Easynews));
    }

    #[test]
    fn test_jackettio_supports_debrid_subset() {
        let supported = AddonKind::Jackettio.supported_services();
        assert_eq!(supported.len(), 5);
        assert!(supported.contains(&ServiceId::RealDebrid));
        assert!(!supported.contains(&ServiceId::PikPak));
        assert!(!supported.contains(&ServiceId::Easynews));
    }
}
