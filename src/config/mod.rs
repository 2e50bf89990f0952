//! Configuration module for site mirroring
//!
//! This module provides the `MirrorConfig` struct and its type-safe builder
//! for configuring a mirroring run with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{MirrorConfigBuilder, WithOutputDir, WithStartUrl};
pub use types::{MirrorConfig, MirrorMode, PageLayout};
