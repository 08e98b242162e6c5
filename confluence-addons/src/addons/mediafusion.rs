//! MediaFusion addon family: wrapper construction and fan-out.
//!
//! MediaFusion receives its encoded user data in the `encoded_user_data`
//! header and can be queried anonymously, so a request with zero usable
//! services still produces one credential-less instance.

use std::sync::Arc;

use confluence_core::ConfluenceConfig;

use super::AddonKind;
use crate::errors::ConfigValidationError;
use crate::fanout;
use crate::token::{self, ConfigToken};
use crate::transport::Transport;
use crate::types::{AggregateResult, MediaFusionOptions, ServiceConfig, StreamRequest};
use crate::wrapper::AddonWrapper;

fn build_wrapper(
    settings: &ConfluenceConfig,
    options: &MediaFusionOptions,
    token: Option<&ConfigToken>,
    override_url: Option<&str>,
    addon_id: &str,
    transport: Arc<dyn Transport>,
) -> AddonWrapper {
    let base_url = match override_url {
        Some(url) => url.to_string(),
        None => settings.mediafusion.url.clone(),
    };
    let name = options
        .override_name
        .clone()
        .unwrap_or_else(|| AddonKind::MediaFusion.default_name().to_string());
    let user_agent = settings
        .mediafusion
        .user_agent
        .clone()
        .unwrap_or_else(|| settings.client.user_agent.to_string());
    let timeout = settings
        .client
        .effective_timeout(options.timeout, settings.mediafusion.timeout);

    // The header is always present; an override query carries it empty.
    let encoded_user_data = token.map(|token| token.as_str().to_string()).unwrap_or_default();
    let headers = vec![
        ("User-Agent".to_string(), user_agent),
        ("encoded_user_data".to_string(), encoded_user_data),
    ];

    AddonWrapper::new(
        AddonKind::MediaFusion,
        name,
        addon_id.to_string(),
        base_url,
        headers,
        timeout,
        transport,
    )
}

/// Queries MediaFusion for one media request across the caller's services.
///
/// Instance cardinality, in priority order: an `override_url` is queried
/// as a single token-less instance; with zero usable services a single
/// anonymous instance is queried (intentional family policy); a
/// prioritised service yields a single instance; otherwise one instance
/// per usable service, all fetched concurrently. Every token and wrapper
/// is built before the first network call, and fetch failures are folded
/// into `addon_errors` rather than returned.
///
/// # Errors
///
/// - `ConfigValidationError::UnsupportedService` - Prioritised service unknown to MediaFusion
/// - `ConfigValidationError::ServiceNotConfigured` - Prioritised service not enabled by the caller
/// - `ConfigValidationError::MissingCredential` - A selected service lacks a required credential
pub async fn get_mediafusion_streams(
    settings: &ConfluenceConfig,
    services: &[ServiceConfig],
    options: &MediaFusionOptions,
    request: &StreamRequest,
    addon_id: &str,
    transport: Arc<dyn Transport>,
) -> Result<AggregateResult, ConfigValidationError> {
    // Override URL bypasses service selection and tokens entirely
    if let Some(override_url) = options.override_url.as_deref() {
        tracing::info!("[{}] querying MediaFusion via override URL", addon_id);
        let wrapper = build_wrapper(settings, options, None, Some(override_url), addon_id, transport);
        return Ok(fanout::run_settled(&[wrapper], request).await);
    }

    let supported = AddonKind::MediaFusion.supported_services();
    let usable = fanout::usable_services(services, supported);

    // No usable service: query anonymously instead of failing
    if usable.is_empty() {
        tracing::info!("[{}] no usable service, querying MediaFusion without debrid", addon_id);
        let token = token::build_mediafusion_token(&settings.mediafusion, None, options)?;
        let wrapper = build_wrapper(settings, options, Some(&token), None, addon_id, transport);
        return Ok(fanout::run_settled(&[wrapper], request).await);
    }

    if let Some(priority) = options.prioritise_service {
        let service = fanout::resolve_priority_service(
            AddonKind::MediaFusion.default_name(),
            priority,
            supported,
            &usable,
        )?;
        tracing::info!("[{}] querying MediaFusion for prioritised service {}", addon_id, service.id);
        let token = token::build_mediafusion_token(&settings.mediafusion, Some(service), options)?;
        if settings.log_credentials {
            tracing::debug!("[{}] MediaFusion user data for {}: {}", addon_id, service.id, token);
        }
        let wrapper = build_wrapper(settings, options, Some(&token), None, addon_id, transport);
        return Ok(fanout::run_settled(&[wrapper], request).await);
    }

    // One instance per usable service, every token built before the first fetch
    let mut wrappers = Vec::with_capacity(usable.len());
    for &service in &usable {
        tracing::info!("[{}] getting MediaFusion streams for {}", addon_id, service.id);
        let token = token::build_mediafusion_token(&settings.mediafusion, Some(service), options)?;
        if settings.log_credentials {
            tracing::debug!("[{}] MediaFusion user data for {}: {}", addon_id, service.id, token);
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

    tracing::info!("[{}] querying {} MediaFusion instance(s)", addon_id, wrappers.len());
    Ok(fanout::run_settled(&wrappers, request).await)
}
