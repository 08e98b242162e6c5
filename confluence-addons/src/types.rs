//! Data types for upstream stream aggregation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Debrid services the upstream addons can resolve streams through.
///
/// Wire names are the lowercase concatenated identifiers the upstreams
/// expect inside their encoded user data (`"realdebrid"`, `"pikpak"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    RealDebrid,
    AllDebrid,
    Premiumize,
    DebridLink,
    Torbox,
    Offcloud,
    PikPak,
    Seedr,
    Easynews,
    Putio,
}

impl ServiceId {
    /// Identifier used on the wire and in encoded user data.
    pub fn wire_name(self) -> &'static str {
        match self {
            ServiceId::RealDebrid => "realdebrid",
            ServiceId::AllDebrid => "alldebrid",
            ServiceId::Premiumize => "premiumize",
            ServiceId::DebridLink => "debridlink",
            ServiceId::Torbox => "torbox",
            ServiceId::Offcloud => "offcloud",
            ServiceId::PikPak => "pikpak",
            ServiceId::Seedr => "seedr",
            ServiceId::Easynews => "easynews",
            ServiceId::Putio => "putio",
        }
    }

    /// Whether this service authenticates with email and password instead
    /// of an API key.
    pub fn uses_email_password(self) -> bool {
        matches!(self, ServiceId::PikPak)
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Credential material for one service.
///
/// Which fields are required depends on the service: PikPak authenticates
/// with `email` + `password`, every other service with `api_key`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCredentials {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Caller-supplied configuration for one service, immutable for the
/// duration of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: ServiceId,
    pub enabled: bool,
    pub credentials: ServiceCredentials,
}

impl ServiceConfig {
    /// Creates an enabled service entry with an API key credential.
    pub fn with_api_key(id: ServiceId, api_key: impl Into<String>) -> Self {
        Self {
            id,
            enabled: true,
            credentials: ServiceCredentials {
                api_key: Some(api_key.into()),
                email: None,
                password: None,
            },
        }
    }

    /// Creates an enabled service entry with email/password credentials.
    pub fn with_login(
        id: ServiceId,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id,
            enabled: true,
            credentials: ServiceCredentials {
                api_key: None,
                email: Some(email.into()),
                password: Some(password.into()),
            },
        }
    }
}

/// Media classification for a stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    /// Wire form used in the upstream request path.
    pub fn wire_name(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

/// One media item to find streams for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub media_type: MediaType,
    /// Stremio-style content id (`"tt0111161"`, `"tt0944947:1:2"`)
    pub id: String,
}

impl StreamRequest {
    pub fn movie(id: impl Into<String>) -> Self {
        Self {
            media_type: MediaType::Movie,
            id: id.into(),
        }
    }

    pub fn series(id: impl Into<String>) -> Self {
        Self {
            media_type: MediaType::Series,
            id: id.into(),
        }
    }

    /// Relative request path under an addon base URL.
    ///
    /// Ids are interpolated verbatim; upstreams expect the `:` separators
    /// of series ids unescaped.
    pub fn path(&self) -> String {
        format!("stream/{}/{}.json", self.media_type.wire_name(), self.id)
    }
}

/// Per-request options for the MediaFusion family.
#[derive(Debug, Clone, Default)]
pub struct MediaFusionOptions {
    /// Query this URL verbatim instead of the configured instance
    pub override_url: Option<String>,
    /// Display name used in logs and error attribution
    pub override_name: Option<String>,
    /// Query only this service instead of every usable one
    pub prioritise_service: Option<ServiceId>,
    /// Per-call timeout, clamped into the configured bounds
    pub timeout: Option<Duration>,
    /// Certification levels to filter out (empty disables the filter)
    pub filter_certification_levels: Vec<String>,
    /// Nudity levels to filter out (empty disables the filter)
    pub filter_nudity: Vec<String>,
    /// Ask the instance to search live instead of serving cached results
    pub live_search_streams: bool,
}

/// Per-request options for the Jackettio family.
#[derive(Debug, Clone, Default)]
pub struct JackettioOptions {
    /// Query this URL verbatim instead of the configured instance
    pub override_url: Option<String>,
    /// Display name used in logs and error attribution
    pub override_name: Option<String>,
    /// Query only this service instead of every usable one
    pub prioritise_service: Option<ServiceId>,
    /// Per-call timeout, clamped into the configured bounds
    pub timeout: Option<Duration>,
}

/// Stremio behavior hints attached to a raw stream entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(
        default,
        rename = "videoSize",
        skip_serializing_if = "Option::is_none"
    )]
    pub video_size: Option<u64>,
    /// Hint fields the aggregator does not consume, preserved as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One stream entry as returned by an upstream addon.
///
/// Only the fields the normalizer consumes are typed; everything else an
/// upstream attaches lands in `extra` so no payload data is lost.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStreamEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "behaviorHints",
        skip_serializing_if = "Option::is_none"
    )]
    pub behavior_hints: Option<BehaviorHints>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawStreamEntry {
    /// Descriptive text for extraction: description first, title as the
    /// fallback.
    pub fn descriptive_text(&self) -> Option<&str> {
        self.description.as_deref().or(self.title.as_deref())
    }
}

/// Body shape of an upstream `stream/{type}/{id}.json` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamsResponse {
    pub streams: Vec<RawStreamEntry>,
}

/// One normalized stream record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedStream {
    /// Playable URL; empty when the upstream entry carried none
    pub url: String,
    pub filename: Option<String>,
    /// Containing folder or pack name when the entry exposes one
    pub folder_name: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    /// Resolution hint (`"1080p"`, `"2160p"`, ...)
    pub quality: Option<String>,
    pub seeders: Option<u32>,
    /// Languages in order of first appearance, no duplicates
    pub languages: Vec<String>,
    /// Whether the stream is already cached on the resolving service
    pub cached: Option<bool>,
}

/// Outcome of normalizing one raw entry.
///
/// Every raw entry maps to exactly one of these; entries are never
/// silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    Stream(ParsedStream),
    Error { message: String },
}

/// Combined outcome of querying one or more upstream instances.
///
/// Both buckets are always present; total upstream failure yields empty
/// streams and one error string per failed instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub addon_streams: Vec<ParsedStream>,
    pub addon_errors: Vec<String>,
}

impl AggregateResult {
    /// Folds another instance outcome into this one, preserving the order
    /// in which outcomes arrive.
    pub fn absorb(&mut self, other: AggregateResult) {
        self.addon_streams.extend(other.addon_streams);
        self.addon_errors.extend(other.addon_errors);
    }
}
