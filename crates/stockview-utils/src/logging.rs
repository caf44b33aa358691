//! Logging and tracing utilities
//!
//! Log output goes to stderr so it never mixes with command output on stdout.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Initialize tracing with a fallback filter used when `RUST_LOG` is unset
///
/// Calling this more than once is harmless; only the first subscriber is installed.
pub fn init_tracing_with_default(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Like [`init_tracing_with_default`], but one JSON object per event
pub fn init_json_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing_with_default("warn");
        init_tracing();
        init_json_tracing("debug");
    }
}
