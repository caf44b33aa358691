//! Application-level configuration shared by stockview binaries

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stockview".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load the environment name from `STOCKVIEW_ENV`, keeping defaults otherwise
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(environment) = std::env::var("STOCKVIEW_ENV") {
            if !environment.trim().is_empty() {
                config.environment = environment.trim().to_string();
            }
        }
        config
    }

    /// Whether this is a production deployment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
            || self.environment.eq_ignore_ascii_case("prod")
    }
}
