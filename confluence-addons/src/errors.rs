//! Error types for upstream stream aggregation.

use thiserror::Error;

/// Fatal configuration errors raised before any network call.
///
/// Returned as `Err` from the aggregation entry points; when one of these
/// occurs, zero upstream fetches have been performed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// The family requires at least one enabled, supported service.
    #[error("No supported service enabled for {addon}")]
    NoServiceEnabled {
        /// Addon display name for attribution
        addon: String,
    },

    /// A prioritised service is not supported by this addon family.
    #[error("{addon} does not support service '{service}'")]
    UnsupportedService {
        /// Addon display name for attribution
        addon: String,
        /// Wire name of the offending service
        service: String,
    },

    /// A prioritised service is supported but not enabled by the caller.
    #[error("Service '{service}' is not enabled for {addon}")]
    ServiceNotConfigured {
        /// Addon display name for attribution
        addon: String,
        /// Wire name of the offending service
        service: String,
    },

    /// A selected service lacks a credential its schema requires.
    #[error("Service '{service}' is missing required credential '{field}'")]
    MissingCredential {
        /// Wire name of the offending service
        service: String,
        /// Name of the missing credential field
        field: String,
    },

    /// An encoded user-data token could not be decoded.
    #[error("Invalid config token: {reason}")]
    InvalidToken {
        /// The reason decoding failed
        reason: String,
    },
}

/// Per-instance fetch failures, recovered by the orchestrator.
///
/// These never abort a fan-out; each is rendered to one entry in
/// `addon_errors` while sibling instances continue.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream did not respond within the effective timeout.
    #[error("{addon} timed out")]
    Timeout {
        /// Addon display name for attribution
        addon: String,
    },

    /// The request failed below the HTTP layer.
    #[error("{addon} request failed: {reason}")]
    Request {
        /// Addon display name for attribution
        addon: String,
        /// The reason for the failure
        reason: String,
    },

    /// The upstream answered with a non-success status.
    #[error("{addon} returned HTTP {status}")]
    BadStatus {
        /// Addon display name for attribution
        addon: String,
        /// HTTP status code
        status: u16,
    },

    /// The upstream body did not match the expected stream response shape.
    #[error("{addon} returned a malformed response: {reason}")]
    MalformedResponse {
        /// Addon display name for attribution
        addon: String,
        /// The reason parsing failed
        reason: String,
    },
}
