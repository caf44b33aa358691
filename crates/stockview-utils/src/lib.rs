//! Shared utilities for stockview
//!
//! This crate provides common functionality used across the stockview workspace,
//! including logging setup and application-level configuration.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{init_json_tracing, init_tracing, init_tracing_with_default};
