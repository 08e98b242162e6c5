//! Tracing setup for Confluence
//!
//! Console-only output with the level controlled by the caller or the
//! `RUST_LOG` environment variable.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize console tracing at the given default level.
///
/// `RUST_LOG` takes precedence over `console_level` when set.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - If a global subscriber is already installed
pub fn init_tracing(console_level: Level) -> Result<(), Box<dyn std::error::Error>> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(console_filter)
        .with(console_layer)
        .try_init()?;

    tracing::info!("Tracing initialized: console={}", console_level);

    Ok(())
}
