//! Service selection and the settle-all fan-out primitive.

use futures::StreamExt;
use futures::stream::FuturesUnordered;

use crate::errors::ConfigValidationError;
use crate::types::{AggregateResult, ServiceConfig, ServiceId, StreamRequest};
use crate::wrapper::AddonWrapper;

/// Filters caller services down to the ones an addon family can use:
/// enabled and in the family's support set.
pub fn usable_services<'a>(
    services: &'a [ServiceConfig],
    supported: &[ServiceId],
) -> Vec<&'a ServiceConfig> {
    services
        .iter()
        .filter(|service| service.enabled && supported.contains(&service.id))
        .collect()
}

/// Resolves a prioritised service against the family support set and the
/// caller's usable services.
///
/// # Errors
/// - `ConfigValidationError::UnsupportedService` - The family cannot use this service at all
/// - `ConfigValidationError::ServiceNotConfigured` - Supported, but the caller has not enabled it
pub fn resolve_priority_service<'a>(
    addon: &str,
    service_id: ServiceId,
    supported: &[ServiceId],
    usable: &[&'a ServiceConfig],
) -> Result<&'a ServiceConfig, ConfigValidationError> {
    if !supported.contains(&service_id) {
        return Err(ConfigValidationError::UnsupportedService {
            addon: addon.to_string(),
            service: service_id.wire_name().to_string(),
        });
    }

    usable
        .iter()
        .find(|service| service.id == service_id)
        .copied()
        .ok_or_else(|| ConfigValidationError::ServiceNotConfigured {
            addon: addon.to_string(),
            service: service_id.wire_name().to_string(),
        })
}

/// Drives every instance's fetch concurrently on the caller's task and
/// merges outcomes in completion order.
///
/// A failed instance contributes its error display string to
/// `addon_errors`; a successful one appends its streams and entry-level
/// errors. Nothing short-circuits: every instance settles, and a failure
/// never aborts siblings.
pub async fn run_settled(wrappers: &[AddonWrapper], request: &StreamRequest) -> AggregateResult {
    let mut in_flight: FuturesUnordered<_> = wrappers
        .iter()
        .map(|wrapper| wrapper.get_parsed_streams(request))
        .collect();

    let mut merged = AggregateResult::default();
    while let Some(outcome) = in_flight.next().await {
        match outcome {
            Ok(result) => merged.absorb(result),
            Err(e) => {
                tracing::warn!("Upstream instance failed: {}", e);
                merged.addon_errors.push(e.to_string());
            }
        }
    }

    merged
}
