//! Encoded user-data tokens for upstream addons.
//!
//! Each addon family accepts its configuration as a base64 token wrapping
//! a fixed-schema JSON payload. Token building validates the credential
//! schema of the selected service, performs no I/O, and is deterministic:
//! identical inputs always produce identical tokens. The payload schemas
//! mirror what the hosted instances expect verbatim, including their
//! historical key spellings, so unused integration fields are carried as
//! fixed constants.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use confluence_core::config::{JackettioConfig, MediaFusionConfig};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigValidationError;
use crate::types::{MediaFusionOptions, ServiceConfig};

/// Opaque encoded user-data token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigToken(String);

impl ConfigToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConfigToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Streaming provider block of the MediaFusion user data.
///
/// `token` is set for API-key services; PikPak authenticates with
/// `email` + `password` instead. Absent credential fields are omitted
/// from the payload entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFusionStreamingProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub service: String,
    pub enable_watchlists_catalogs: bool,
    pub download_via_browser: bool,
    pub only_show_cached_streams: bool,
}

/// One sorting directive in the MediaFusion user data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortingPriority {
    pub key: String,
    pub direction: String,
}

impl SortingPriority {
    fn desc(key: &str) -> Self {
        Self {
            key: key.to_string(),
            direction: "desc".to_string(),
        }
    }
}

/// Complete MediaFusion user-data payload.
///
/// `streaming_provider` serializes as `null` for anonymous queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFusionUserData {
    pub streaming_provider: Option<MediaFusionStreamingProvider>,
    pub selected_catalogs: Vec<String>,
    pub selected_resolutions: Vec<Option<String>>,
    pub enable_catalogs: bool,
    pub enable_imdb_metadata: bool,
    pub max_size: String,
    pub max_streams_per_resolution: String,
    pub torrent_sorting_priority: Vec<SortingPriority>,
    pub show_full_torrent_name: bool,
    pub show_language_country_flag: bool,
    pub nudity_filter: Vec<String>,
    pub certification_filter: Vec<String>,
    pub language_sorting: Vec<Option<String>>,
    pub quality_filter: Vec<String>,
    pub api_password: Option<String>,
    pub mediaflow_config: Option<serde_json::Value>,
    pub rpdb_config: Option<serde_json::Value>,
    pub live_search_streams: bool,
    pub contribution_streams: bool,
    pub mdblist_config: Option<serde_json::Value>,
}

/// Complete Jackettio user-data payload.
///
/// Wire keys are camelCase; the two `priotize*` spellings are what the
/// hosted instances parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JackettioUserData {
    pub max_torrents: u32,
    #[serde(rename = "priotizePackTorrents")]
    pub prioritise_pack_torrents: u32,
    pub exclude_keywords: Vec<String>,
    pub debrid_id: String,
    pub debrid_api_key: String,
    pub hide_uncached: bool,
    pub sort_cached: Vec<(String, bool)>,
    pub sort_uncached: Vec<(String, bool)>,
    pub force_cache_next_episode: bool,
    #[serde(rename = "priotizeLanguages")]
    pub prioritise_languages: Vec<String>,
    pub indexer_timeout_sec: u32,
    pub meta_language: String,
    pub enable_media_flow: bool,
    pub mediaflow_proxy_url: String,
    pub mediaflow_api_password: String,
    pub mediaflow_public_ip: String,
    pub use_strem_thru: bool,
    pub stremthru_url: String,
    pub qualities: Vec<u32>,
    pub indexers: Vec<String>,
}

/// Checks that a service carries every credential its schema requires.
///
/// An empty string counts as missing.
fn validate_credentials(service: &ServiceConfig) -> Result<(), ConfigValidationError> {
    let missing = |field: &str| ConfigValidationError::MissingCredential {
        service: service.id.wire_name().to_string(),
        field: field.to_string(),
    };
    let has = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

    if service.id.uses_email_password() {
        if !has(&service.credentials.email) {
            return Err(missing("email"));
        }
        if !has(&service.credentials.password) {
            return Err(missing("password"));
        }
    } else if !has(&service.credentials.api_key) {
        return Err(missing("api_key"));
    }

    Ok(())
}

/// Builds the MediaFusion token for one service, or for an anonymous
/// query when `service` is `None`.
///
/// # Errors
///
/// - `ConfigValidationError::MissingCredential` - Selected service lacks a required credential field
pub fn build_mediafusion_token(
    settings: &MediaFusionConfig,
    service: Option<&ServiceConfig>,
    options: &MediaFusionOptions,
) -> Result<ConfigToken, ConfigValidationError> {
    let streaming_provider = match service {
        Some(service) => {
            validate_credentials(service)?;
            Some(MediaFusionStreamingProvider {
                token: if service.id.uses_email_password() {
                    None
                } else {
                    service.credentials.api_key.clone()
                },
                email: service.credentials.email.clone(),
                password: service.credentials.password.clone(),
                service: service.id.wire_name().to_string(),
                enable_watchlists_catalogs: false,
                download_via_browser: false,
                only_show_cached_streams: false,
            })
        }
        None => None,
    };

    let filter_or_disabled = |levels: &[String]| -> Vec<String> {
        if levels.is_empty() {
            vec!["Disable".to_string()]
        } else {
            levels.iter().map(|level| level.trim().to_string()).collect()
        }
    };

    let user_data = MediaFusionUserData {
        streaming_provider,
        selected_catalogs: Vec::new(),
        selected_resolutions: selected_resolutions(),
        enable_catalogs: true,
        enable_imdb_metadata: false,
        max_size: "inf".to_string(),
        max_streams_per_resolution: "500".to_string(),
        torrent_sorting_priority: [
            "language",
            "cached",
            "resolution",
            "quality",
            "size",
            "seeders",
            "created_at",
        ]
        .iter()
        .map(|key| SortingPriority::desc(key))
        .collect(),
        show_full_torrent_name: true,
        show_language_country_flag: true,
        nudity_filter: filter_or_disabled(&options.filter_nudity),
        certification_filter: filter_or_disabled(&options.filter_certification_levels),
        language_sorting: language_sorting(),
        quality_filter: ["BluRay/UHD", "WEB/HD", "DVD/TV/SAT", "CAM/Screener", "Unknown"]
            .iter()
            .map(|quality| quality.to_string())
            .collect(),
        api_password: settings.api_password.clone(),
        mediaflow_config: None,
        rpdb_config: None,
        live_search_streams: options.live_search_streams,
        contribution_streams: false,
        mdblist_config: None,
    };

    let json = serde_json::to_string(&user_data)
        .expect("user data serialization should not fail");
    Ok(ConfigToken(URL_SAFE_NO_PAD.encode(json)))
}

/// Builds the Jackettio token for one service.
///
/// # Errors
///
/// - `ConfigValidationError::MissingCredential` - Service lacks a required credential field
pub fn build_jackettio_token(
    settings: &JackettioConfig,
    service: &ServiceConfig,
) -> Result<ConfigToken, ConfigValidationError> {
    validate_credentials(service)?;

    let user_data = JackettioUserData {
        max_torrents: 30,
        prioritise_pack_torrents: 2,
        exclude_keywords: Vec::new(),
        debrid_id: service.id.wire_name().to_string(),
        debrid_api_key: service
            .credentials
            .api_key
            .clone()
            .unwrap_or_default(),
        hide_uncached: false,
        sort_cached: vec![
            ("quality".to_string(), true),
            ("size".to_string(), true),
        ],
        sort_uncached: vec![("seeders".to_string(), true)],
        force_cache_next_episode: false,
        prioritise_languages: Vec::new(),
        indexer_timeout_sec: 60,
        meta_language: String::new(),
        enable_media_flow: false,
        mediaflow_proxy_url: String::new(),
        mediaflow_api_password: String::new(),
        mediaflow_public_ip: String::new(),
        use_strem_thru: true,
        stremthru_url: settings.stremthru_url.clone(),
        qualities: vec![0, 360, 480, 720, 1080, 2160],
        indexers: settings.indexers.clone(),
    };

    let json = serde_json::to_string(&user_data)
        .expect("user data serialization should not fail");
    Ok(ConfigToken(STANDARD.encode(json)))
}

/// Decodes a MediaFusion token back into its payload.
///
/// # Errors
///
/// - `ConfigValidationError::InvalidToken` - Token is not URL-safe base64 or wraps an unexpected payload
pub fn decode_mediafusion_user_data(
    token: &ConfigToken,
) -> Result<MediaFusionUserData, ConfigValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.as_str()).map_err(|e| {
        ConfigValidationError::InvalidToken {
            reason: format!("base64 decode failed: {e}"),
        }
    })?;

    serde_json::from_slice(&bytes).map_err(|e| ConfigValidationError::InvalidToken {
        reason: format!("payload decode failed: {e}"),
    })
}

/// Decodes a Jackettio token back into its payload.
///
/// # Errors
///
/// - `ConfigValidationError::InvalidToken` - Token is not standard base64 or wraps an unexpected payload
pub fn decode_jackettio_user_data(
    token: &ConfigToken,
) -> Result<JackettioUserData, ConfigValidationError> {
    let bytes =
        STANDARD
            .decode(token.as_str())
            .map_err(|e| ConfigValidationError::InvalidToken {
                reason: format!("base64 decode failed: {e}"),
            })?;

    serde_json::from_slice(&bytes).map_err(|e| ConfigValidationError::InvalidToken {
        reason: format!("payload decode failed: {e}"),
    })
}

fn selected_resolutions() -> Vec<Option<String>> {
    let mut resolutions: Vec<Option<String>> = [
        "4k", "2160p", "1440p", "1080p", "720p", "576p", "480p", "360p", "240p",
    ]
    .iter()
    .map(|resolution| Some(resolution.to_string()))
    .collect();
    resolutions.push(None);
    resolutions
}

fn language_sorting() -> Vec<Option<String>> {
    let mut languages: Vec<Option<String>> = [
        "English",
        "Tamil",
        "Hindi",
        "Malayalam",
        "Kannada",
        "Telugu",
        "Chinese",
        "Russian",
        "Arabic",
        "Japanese",
        "Korean",
        "Taiwanese",
        "Latino",
        "French",
        "Spanish",
        "Portuguese",
        "Italian",
        "German",
        "Ukrainian",
        "Polish",
        "Czech",
        "Thai",
        "Indonesian",
        "Vietnamese",
        "Dutch",
        "Bengali",
        "Turkish",
        "Greek",
        "Swedish",
    ]
    .iter()
    .map(|language| Some(language.to_string()))
    .collect();
    languages.push(None);
    languages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceId;

    #[test]
    fn test_mediafusion_token_is_deterministic() {
        let settings = MediaFusionConfig::default();
        let service = ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key");
        let options = MediaFusionOptions::default();

        let first = build_mediafusion_token(&settings, Some(&service), &options).unwrap();
        let second = build_mediafusion_token(&settings, Some(&service), &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mediafusion_token_roundtrip() {
        let settings = MediaFusionConfig {
            api_password: Some("instance-pass".to_string()),
            ..Default::default()
        };
        let service = ServiceConfig::with_api_key(ServiceId::Torbox, "tb-key");
        let options = MediaFusionOptions::default();

        let token = build_mediafusion_token(&settings, Some(&service), &options).unwrap();
        let decoded = decode_mediafusion_user_data(&token).unwrap();

        let provider = decoded.streaming_provider.unwrap();
        assert_eq!(provider.service, "torbox");
        assert_eq!(provider.token.as_deref(), Some("tb-key"));
        assert_eq!(provider.email, None);
        assert_eq!(decoded.api_password.as_deref(), Some("instance-pass"));
        assert_eq!(decoded.max_size, "inf");
        assert_eq!(decoded.nudity_filter, vec!["Disable"]);
    }

    #[test]
    fn test_mediafusion_token_is_url_safe_without_padding() {
        let settings = MediaFusionConfig::default();
        let options = MediaFusionOptions::default();

        let token = build_mediafusion_token(&settings, None, &options).unwrap();
        assert!(!token.as_str().contains('+'));
        assert!(!token.as_str().contains('/'));
        assert!(!token.as_str().contains('='));
    }

    #[test]
    fn test_mediafusion_anonymous_token_has_null_provider() {
        let settings = MediaFusionConfig::default();
        let options = MediaFusionOptions::default();

        let token = build_mediafusion_token(&settings, None, &options).unwrap();
        let decoded = decode_mediafusion_user_data(&token).unwrap();
        assert_eq!(decoded.streaming_provider, None);
    }

    #[test]
    fn test_mediafusion_pikpak_uses_login_fields() {
        let settings = MediaFusionConfig::default();
        let service = ServiceConfig::with_login(ServiceId::PikPak, "a@b.c", "hunter2");
        let options = MediaFusionOptions::default();

        let token = build_mediafusion_token(&settings, Some(&service), &options).unwrap();
        let decoded = decode_mediafusion_user_data(&token).unwrap();

        let provider = decoded.streaming_provider.unwrap();
        assert_eq!(provider.token, None);
        assert_eq!(provider.email.as_deref(), Some("a@b.c"));
        assert_eq!(provider.password.as_deref(), Some("hunter2"));
        assert_eq!(provider.service, "pikpak");
    }

    #[test]
    fn test_mediafusion_missing_api_key() {
        let settings = MediaFusionConfig::default();
        let service = ServiceConfig {
            id: ServiceId::RealDebrid,
            enabled: true,
            credentials: Default::default(),
        };

        let error = build_mediafusion_token(&settings, Some(&service), &Default::default())
            .unwrap_err();
        assert_eq!(
            error,
            ConfigValidationError::MissingCredential {
                service: "realdebrid".to_string(),
                field: "api_key".to_string(),
            }
        );
    }

    #[test]
    fn test_mediafusion_pikpak_missing_password() {
        let settings = MediaFusionConfig::default();
        let service = ServiceConfig {
            id: ServiceId::PikPak,
            enabled: true,
            credentials: crate::types::ServiceCredentials {
                email: Some("a@b.c".to_string()),
                ..Default::default()
            },
        };

        let error = build_mediafusion_token(&settings, Some(&service), &Default::default())
            .unwrap_err();
        assert_eq!(
            error,
            ConfigValidationError::MissingCredential {
                service: "pikpak".to_string(),
                field: "password".to_string(),
            }
        );
    }

    #[test]
    fn test_mediafusion_filters_default_to_disable() {
        let settings = MediaFusionConfig::default();
        let options = MediaFusionOptions {
            filter_nudity: vec!["Severe".to_string(), " Moderate ".to_string()],
            ..Default::default()
        };

        let token = build_mediafusion_token(&settings, None, &options).unwrap();
        let decoded = decode_mediafusion_user_data(&token).unwrap();
        assert_eq!(decoded.nudity_filter, vec!["Severe", "Moderate"]);
        assert_eq!(decoded.certification_filter, vec!["Disable"]);
    }

    #[test]
    fn test_jackettio_token_roundtrip() {
        let settings = JackettioConfig::default();
        let service = ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key");

        let token = build_jackettio_token(&settings, &service).unwrap();
        let decoded = decode_jackettio_user_data(&token).unwrap();

        assert_eq!(decoded.debrid_id, "realdebrid");
        assert_eq!(decoded.debrid_api_key, "rd-key");
        assert_eq!(decoded.max_torrents, 30);
        assert_eq!(decoded.indexer_timeout_sec, 60);
        assert_eq!(decoded.qualities, vec![0, 360, 480, 720, 1080, 2160]);
        assert_eq!(decoded.indexers, settings.indexers);
        assert!(decoded.use_strem_thru);
    }

    #[test]
    fn test_jackettio_wire_keys_match_instance_expectations() {
        let settings = JackettioConfig::default();
        let service = ServiceConfig::with_api_key(ServiceId::AllDebrid, "ad-key");

        let token = build_jackettio_token(&settings, &service).unwrap();
        let bytes = STANDARD.decode(token.as_str()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["maxTorrents"], 30);
        assert_eq!(value["priotizePackTorrents"], 2);
        assert_eq!(value["debridId"], "alldebrid");
        assert_eq!(value["sortCached"][0][0], "quality");
        assert_eq!(value["useStremThru"], true);
    }

    #[test]
    fn test_jackettio_missing_api_key() {
        let settings = JackettioConfig::default();
        // Empty keys count as missing, matching how the upstreams reject them
        let service = ServiceConfig::with_api_key(ServiceId::Premiumize, "");

        let error = build_jackettio_token(&settings, &service).unwrap_err();
        assert_eq!(
            error,
            ConfigValidationError::MissingCredential {
                service: "premiumize".to_string(),
                field: "api_key".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let error =
            decode_mediafusion_user_data(&ConfigToken("not base64 at all!".to_string()))
                .unwrap_err();
        assert!(matches!(error, ConfigValidationError::InvalidToken { .. }));

        let error = decode_jackettio_user_data(&ConfigToken(
            STANDARD.encode("{\"not\": \"the schema\"}"),
        ))
        .unwrap_err();
        assert!(matches!(error, ConfigValidationError::InvalidToken { .. }));
    }
}
