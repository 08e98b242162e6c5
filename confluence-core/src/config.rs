//! Centralized configuration for Confluence.
//!
//! All tunable parameters and upstream endpoints are defined here to avoid
//! hard-coded values scattered throughout the codebase. Configuration is a
//! plain value passed explicitly into the aggregation entry points.

use std::time::Duration;

/// Central configuration for all Confluence components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct ConfluenceConfig {
    pub client: ClientConfig,
    pub mediafusion: MediaFusionConfig,
    pub jackettio: JackettioConfig,
    /// Whether credential values may appear in log output.
    ///
    /// Off by default; when off, callers log placeholder text instead of
    /// API keys and passwords.
    pub log_credentials: bool,
}

/// HTTP client behavior shared by every upstream addon.
///
/// Controls request timeouts and their clamping bounds, plus the
/// identifying user agent.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout applied when neither the caller nor the addon section
    /// specifies one
    pub default_timeout: Duration,
    /// Lower clamp bound for any requested timeout
    pub min_timeout: Duration,
    /// Upper clamp bound for any requested timeout
    pub max_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(15),
            min_timeout: Duration::from_secs(1),
            max_timeout: Duration::from_secs(50),
            user_agent: "confluence/0.1.0",
        }
    }
}

impl ClientConfig {
    /// Resolves the timeout for one upstream request.
    ///
    /// Takes the first of: caller override, addon section default, global
    /// default, then clamps the result into `[min_timeout, max_timeout]`.
    pub fn effective_timeout(
        &self,
        requested: Option<Duration>,
        addon_default: Option<Duration>,
    ) -> Duration {
        requested
            .or(addon_default)
            .unwrap_or(self.default_timeout)
            .clamp(self.min_timeout, self.max_timeout)
    }
}

/// MediaFusion upstream endpoint configuration.
#[derive(Debug, Clone)]
pub struct MediaFusionConfig {
    /// Base URL of the hosted MediaFusion instance
    pub url: String,
    /// Instance API password, forwarded inside encoded user data when set
    pub api_password: Option<String>,
    /// Addon-level timeout default (falls back to `ClientConfig`)
    pub timeout: Option<Duration>,
    /// Addon-level user agent override
    pub user_agent: Option<String>,
}

impl Default for MediaFusionConfig {
    fn default() -> Self {
        Self {
            url: "https://mediafusion.elfhosted.com/".to_string(),
            api_password: None,
            timeout: None,
            user_agent: None,
        }
    }
}

/// Jackettio upstream endpoint configuration.
#[derive(Debug, Clone)]
pub struct JackettioConfig {
    /// Base URL of the hosted Jackettio instance
    pub url: String,
    /// Indexers requested from the instance
    pub indexers: Vec<String>,
    /// StremThru proxy URL forwarded inside encoded user data
    pub stremthru_url: String,
    /// Addon-level timeout default (falls back to `ClientConfig`)
    pub timeout: Option<Duration>,
    /// Addon-level user agent override
    pub user_agent: Option<String>,
    /// Rewrite scheme of returned stream URLs when set
    pub force_protocol: Option<String>,
    /// Rewrite host of returned stream URLs when set
    pub force_hostname: Option<String>,
    /// Rewrite port of returned stream URLs when set
    pub force_port: Option<u16>,
}

impl Default for JackettioConfig {
    fn default() -> Self {
        Self {
            url: "https://jackettio.elfhosted.com/".to_string(),
            indexers: vec![
                "eztv".to_string(),
                "thepiratebay".to_string(),
                "therarbg".to_string(),
                "yts".to_string(),
            ],
            stremthru_url: "https://stremthru.13377001.xyz".to_string(),
            timeout: None,
            user_agent: None,
            force_protocol: None,
            force_hostname: None,
            force_port: None,
        }
    }
}

impl ConfluenceConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Client configuration overrides
        if let Ok(timeout) = std::env::var("CONFLUENCE_DEFAULT_TIMEOUT_MS") {
            if let Ok(millis) = timeout.parse::<u64>() {
                config.client.default_timeout = Duration::from_millis(millis);
            }
        }

        if let Ok(enabled) = std::env::var("CONFLUENCE_LOG_CREDENTIALS") {
            config.log_credentials = enabled.parse().unwrap_or(false);
        }

        // MediaFusion configuration overrides
        if let Ok(url) = std::env::var("CONFLUENCE_MEDIAFUSION_URL") {
            config.mediafusion.url = url;
        }

        if let Ok(password) = std::env::var("CONFLUENCE_MEDIAFUSION_API_PASSWORD") {
            config.mediafusion.api_password = Some(password);
        }

        if let Ok(timeout) = std::env::var("CONFLUENCE_MEDIAFUSION_TIMEOUT_MS") {
            if let Ok(millis) = timeout.parse::<u64>() {
                config.mediafusion.timeout = Some(Duration::from_millis(millis));
            }
        }

        // Jackettio configuration overrides
        if let Ok(url) = std::env::var("CONFLUENCE_JACKETTIO_URL") {
            config.jackettio.url = url;
        }

        if let Ok(indexers) = std::env::var("CONFLUENCE_JACKETTIO_INDEXERS") {
            let parsed: Vec<String> = indexers
                .split(',')
                .map(|indexer| indexer.trim().to_string())
                .filter(|indexer| !indexer.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.jackettio.indexers = parsed;
            }
        }

        if let Ok(url) = std::env::var("CONFLUENCE_JACKETTIO_STREMTHRU_URL") {
            config.jackettio.stremthru_url = url;
        }

        if let Ok(timeout) = std::env::var("CONFLUENCE_JACKETTIO_TIMEOUT_MS") {
            if let Ok(millis) = timeout.parse::<u64>() {
                config.jackettio.timeout = Some(Duration::from_millis(millis));
            }
        }

        if let Ok(protocol) = std::env::var("CONFLUENCE_FORCE_JACKETTIO_PROTOCOL") {
            config.jackettio.force_protocol = Some(protocol);
        }

        if let Ok(hostname) = std::env::var("CONFLUENCE_FORCE_JACKETTIO_HOSTNAME") {
            config.jackettio.force_hostname = Some(hostname);
        }

        if let Ok(port) = std::env::var("CONFLUENCE_FORCE_JACKETTIO_PORT") {
            if let Ok(value) = port.parse::<u16>() {
                config.jackettio.force_port = Some(value);
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Tight timeout so tests exercising real sockets fail fast.
    pub fn for_testing() -> Self {
        Self {
            client: ClientConfig {
                default_timeout: Duration::from_secs(2),
                ..ClientConfig::default()
            },
            ..Default::default()
        }
    }
}
