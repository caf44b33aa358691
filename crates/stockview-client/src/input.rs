//! Symbol and analysis-mode input holder

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quick-pick tickers offered next to the symbol field
pub const POPULAR_SYMBOLS: [&str; 4] = ["AAPL", "MSFT", "GOOGL", "TSLA"];

/// Kind of analysis the service should run
///
/// Closed set; the wire names are the exact strings the service matches on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMode {
    /// Price, fundamentals, analyst views, technicals and outlook
    #[default]
    #[serde(rename = "Complete Analysis")]
    CompleteAnalysis,
    /// Latest news with market impact assessment
    #[serde(rename = "News Impact")]
    NewsImpact,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 2] = [AnalysisMode::CompleteAnalysis, AnalysisMode::NewsImpact];

    /// Wire name of the mode
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::CompleteAnalysis => "Complete Analysis",
            AnalysisMode::NewsImpact => "News Impact",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "complete" | "complete analysis" | "full" | "c" => Ok(AnalysisMode::CompleteAnalysis),
            "news" | "news impact" | "n" => Ok(AnalysisMode::NewsImpact),
            _ => Err(AnalysisError::UnknownMode(s.trim().to_string())),
        }
    }
}

/// Trim and uppercase a user-entered ticker
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Current contents of the symbol field and mode selector
///
/// Plain data; the controller reads a snapshot of it on submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisForm {
    /// Symbol exactly as typed
    pub symbol: String,
    pub mode: AnalysisMode,
}

impl Default for AnalysisForm {
    fn default() -> Self {
        Self {
            symbol: "GOOGL".to_string(),
            mode: AnalysisMode::default(),
        }
    }
}

impl AnalysisForm {
    pub fn new(symbol: impl Into<String>, mode: AnalysisMode) -> Self {
        Self {
            symbol: symbol.into(),
            mode,
        }
    }

    pub fn set_symbol(&mut self, symbol: impl Into<String>) {
        self.symbol = symbol.into();
    }

    pub fn set_mode(&mut self, mode: AnalysisMode) {
        self.mode = mode;
    }

    /// Symbol as it would be sent
    pub fn normalized_symbol(&self) -> String {
        normalize_symbol(&self.symbol)
    }

    pub fn snapshot(&self) -> AnalysisForm {
        self.clone()
    }
}
