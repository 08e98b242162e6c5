//! Jackettio addon family: wrapper construction and fan-out.
//!
//! Jackettio receives its encoded user data as a path segment ahead of
//! the request path and has no anonymous mode: with zero usable services
//! the query fails before any network call (intentional family policy,
//! the counterpart of MediaFusion's anonymous fallback). Stream URLs can
//! be rewritten through the configured host override, which covers
//! instances that are queried on a private address but hand out public
//! playback URLs.

use std::sync::Arc;

use confluence_core::ConfluenceConfig;

use super::AddonKind;
use crate::errors::ConfigValidationError;
use crate::fanout;
use crate::parse::HostOverride;
use crate::token::{self, ConfigToken};
use crate::transport::Transport;
use crate::types::{AggregateResult, JackettioOptions, ServiceConfig, StreamRequest};
use crate::wrapper::AddonWrapper;

fn build_wrapper(
    settings: &ConfluenceConfig,
    options: &JackettioOptions,
    token: Option<&ConfigToken>,
    override_url: Option<&str>,
    addon_id: &str,
    transport: Arc<dyn Transport>,
) -> AddonWrapper {
    let base_url = match override_url {
        Some(url) => url.to_string(),
        None => {
            let mut url = settings.jackettio.url.clone();
            if !url.ends_with('/') {
                url.push('/');
            }
            match token {
                Some(token) => format!("{url}{token}/"),
                None => url,
            }
        }
    };
    let name = options
        .override_name
        .clone()
        .unwrap_or_else(|| AddonKind::Jackettio.default_name().to_string());
    let user_agent = settings
        .jackettio
        .user_agent
        .clone()
        .unwrap_or_else(|| settings.client.user_agent.to_string());
    let timeout = settings
        .client
        .effective_timeout(options.timeout, settings.jackettio.timeout);
    let host_override = HostOverride {
        protocol: settings.jackettio.force_protocol.clone(),
        hostname: settings.jackettio.force_hostname.clone(),
        port: settings.jackettio.force_port,
    };

    AddonWrapper::new(
        AddonKind::Jackettio,
        name,
        addon_id.to_string(),
        base_url,
        vec![("User-Agent".to_string(), user_agent)],
        timeout,
        transport,
    )
    .with_host_override(host_override)
}

/// Queries Jackettio for one media request across the caller's services.
///
/// Instance cardinality, in priority order: an `override_url` is queried
/// as a single token-less instance; zero usable services is a fatal
/// `NoServiceEnabled`; a prioritised service yields a single instance;
/// otherwise one instance per usable service, all fetched concurrently.
/// Every token and wrapper is built before the first network call, and
/// fetch failures are folded into `addon_errors` rather than returned.
///
/// # Errors
///
/// - `ConfigValidationError::NoServiceEnabled` - No enabled service Jackettio supports
/// - `ConfigValidationError::UnsupportedService` - Prioritised service unknown to Jackettio
/// - `ConfigValidationError::ServiceNotConfigured` - Prioritised service not enabled by the caller
/// - `ConfigValidationError::MissingCredential` - A selected service lacks a required credential
pub async fn get_jackettio_streams(
    settings: &ConfluenceConfig,
    services: &[ServiceConfig],
    options: &JackettioOptions,
    request: &StreamRequest,
    addon_id: &str,
    transport: Arc<dyn Transport>,
) -> Result<AggregateResult, ConfigValidationError> {
    // Override URL bypasses service selection and tokens entirely
    if let Some(override_url) = options.override_url.as_deref() {
        tracing::info!("[{}] querying Jackettio via override URL", addon_id);
        let wrapper = build_wrapper(settings, options, None, Some(override_url), addon_id, transport);
        return Ok(fanout::run_settled(&[wrapper], request).await);
    }

    let supported = AddonKind::Jackettio.supported_services();
    let usable = fanout::usable_services(services, supported);

    if usable.is_empty() {
        return Err(ConfigValidationError::NoServiceEnabled {
            addon: AddonKind::Jackettio.default_name().to_string(),
        });
    }

    if let Some(priority) = options.prioritise_service {
        let service = fanout::resolve_priority_service(
            AddonKind::Jackettio.default_name(),
            priority,
            supported,
            &usable,
        )?;
        tracing::info!("[{}] querying Jackettio for prioritised service {}", addon_id, service.id);
        let token = token::build_jackettio_token(&settings.jackettio, service)?;
        if settings.log_credentials {
            tracing::debug!("[{}] Jackettio user data for {}: {}", addon_id, service.id, token);
        }
        let wrapper = build_wrapper(settings, options, Some(&token), None, addon_id, transport);
        return Ok(fanout::run_settled(&[wrapper], request).await);
    }

    // One instance per usable service, every token built before the first fetch
    let mut wrappers = Vec::with_capacity(usable.len());
    for &service in &usable {
        tracing::info!("[{}] getting Jackettio streams for {}", addon_id, service.id);
        let token = token::build_jackettio_token(&settings.jackettio, service)?;
        if settings.log_credentials {
            tracing::debug!("[{}] Jackettio user data for {}: {}", addon_id, service.id, token);
        }
        wrappers.push(build_wrapper(
            settings,
            options,
            Some(&token),
            None,
            addon_id,
            Arc::clone(&transport),
        ));
    }

    tracing::info!("[{}] querying {} Jackettio instance(s)", addon_id, wrappers.len());
    Ok(fanout::run_settled(&wrappers, request).await)
}
