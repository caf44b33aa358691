//! Configuration for the analysis client

use crate::error::{AnalysisError, Result};
use crate::transport::Route;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Analysis service used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5001";

/// Configuration for the analysis client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the analysis service; routes are joined onto it
    pub api_base: String,

    /// Whole-request timeout; `None` leaves it to the transport
    pub request_timeout: Option<Duration>,

    /// Assistant turns kept in memory
    pub max_chat_history: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
            max_chat_history: 50,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overridden by `STOCKVIEW_API_URL` / `STOCKVIEW_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env().build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AnalysisError::Config(format!(
                "API URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(AnalysisError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_chat_history == 0 {
            return Err(AnalysisError::Config(
                "max_chat_history must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute URL for a service route
    pub fn endpoint(&self, route: Route) -> Result<Url> {
        // Without a trailing slash, `join` would replace the last path segment.
        let mut base = self.api_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?.join(route.path())?)
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_base: Option<String>,
    request_timeout: Option<Duration>,
    max_chat_history: Option<usize>,
}

impl ClientConfigBuilder {
    /// Set the service base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set assistant history size
    pub fn max_chat_history(mut self, turns: usize) -> Self {
        self.max_chat_history = Some(turns);
        self
    }

    /// Load overrides from the environment
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("STOCKVIEW_API_URL") {
            if !url.trim().is_empty() {
                self.api_base = Some(url.trim().to_string());
            }
        }
        if let Some(secs) = std::env::var("STOCKVIEW_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClientConfig> {
        let defaults = ClientConfig::default();

        let config = ClientConfig {
            api_base: self.api_base.unwrap_or(defaults.api_base),
            request_timeout: self.request_timeout.or(defaults.request_timeout),
            max_chat_history: self.max_chat_history.unwrap_or(defaults.max_chat_history),
        };

        config.validate()?;
        Ok(config)
    }
}
