//! Confluence Addons - Stream aggregation across upstream addons
//!
//! Fans a single media request out to MediaFusion and Jackettio instances,
//! normalizes their heterogeneous stream payloads into one uniform record,
//! and merges the results while keeping partial failures visible. Each
//! addon family contributes its own credential encoding and payload
//! dialect; everything downstream of the raw response is shared.

pub mod addons;
pub mod errors;
pub mod fanout;
pub mod parse;
pub mod token;
pub mod transport;
pub mod types;
pub mod wrapper;

mod integration_tests;

// Re-export main types
pub use addons::{AddonKind, get_jackettio_streams, get_mediafusion_streams};
pub use errors::{ConfigValidationError, FetchError};
pub use token::ConfigToken;
pub use transport::{HttpTransport, Transport};
pub use types::{
    AggregateResult, JackettioOptions, MediaFusionOptions, MediaType, ParsedStream, ServiceConfig,
    ServiceCredentials, ServiceId, StreamRequest,
};
pub use wrapper::AddonWrapper;

/// Convenience type alias for Results with ConfigValidationError.
pub type Result<T> = std::result::Result<T, ConfigValidationError>;
