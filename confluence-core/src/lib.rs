//! Confluence Core - Configuration and runtime plumbing
//!
//! This crate provides the shared building blocks for the Confluence
//! aggregator: centralized configuration with environment overrides and
//! tracing initialization.

pub mod config;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{ClientConfig, ConfluenceConfig, JackettioConfig, MediaFusionConfig};
