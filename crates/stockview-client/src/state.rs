//! Request lifecycle state

use crate::api::AnalysisRequestBody;
use crate::error::AnalysisError;
use crate::input::AnalysisMode;
use chrono::{DateTime, Utc};
use stockview_markdown::RenderedDocument;

/// A validated request, immutable once sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Controller sequence number; higher means newer
    pub seq: u64,
    /// Trimmed, uppercased, non-empty
    pub symbol: String,
    pub mode: AnalysisMode,
}

impl AnalysisRequest {
    pub fn body(&self) -> AnalysisRequestBody {
        AnalysisRequestBody {
            stock_symbol: self.symbol.clone(),
            analysis_type: self.mode,
        }
    }
}

/// What the presentation layer should show
///
/// Every transition replaces the whole value, so a `Failed` after a `Success`
/// leaves nothing of the earlier result behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Request sent, no reply applied yet
    Loading { request: AnalysisRequest },
    /// Raw markdown from the service; rendered on demand
    Success {
        request: AnalysisRequest,
        markdown: String,
        received_at: DateTime<Utc>,
    },
    /// `request` is `None` when validation failed before anything was sent
    Failed {
        request: Option<AnalysisRequest>,
        error: AnalysisError,
    },
}

impl RequestState {
    pub fn is_idle(&self) -> bool {
        matches!(self, RequestState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading { .. })
    }

    /// `Success` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Success { .. } | RequestState::Failed { .. }
        )
    }

    pub fn request(&self) -> Option<&AnalysisRequest> {
        match self {
            RequestState::Idle => None,
            RequestState::Loading { request } | RequestState::Success { request, .. } => {
                Some(request)
            }
            RequestState::Failed { request, .. } => request.as_ref(),
        }
    }

    pub fn markdown(&self) -> Option<&str> {
        match self {
            RequestState::Success { markdown, .. } => Some(markdown),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            RequestState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// User-facing error text
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    /// Render the markdown of a `Success` state
    pub fn render(&self) -> Option<RenderedDocument> {
        self.markdown().map(stockview_markdown::render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(seq: u64) -> AnalysisRequest {
        AnalysisRequest {
            seq,
            symbol: "AAPL".to_string(),
            mode: AnalysisMode::CompleteAnalysis,
        }
    }

    #[test]
    fn test_default_is_idle() {
        let state = RequestState::default();
        assert!(state.is_idle());
        assert!(!state.is_terminal());
        assert!(state.request().is_none());
    }

    #[test]
    fn test_accessors() {
        let loading = RequestState::Loading { request: request(1) };
        assert!(loading.is_loading());
        assert!(!loading.is_terminal());
        assert_eq!(loading.request().map(|r| r.seq), Some(1));
        assert!(loading.render().is_none());

        let failed = RequestState::Failed {
            request: None,
            error: AnalysisError::EmptySymbol,
        };
        assert!(failed.is_terminal());
        assert!(failed.request().is_none());
        assert_eq!(
            failed.error_message().as_deref(),
            Some("Please enter a stock symbol.")
        );
    }

    #[test]
    fn test_success_renders_markdown() {
        let state = RequestState::Success {
            request: request(2),
            markdown: "# Hi".to_string(),
            received_at: Utc::now(),
        };
        assert_eq!(state.markdown(), Some("# Hi"));
        assert!(state.error().is_none());

        let doc = state.render().unwrap();
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].heading_text().as_deref(), Some("Hi"));
    }

    #[test]
    fn test_request_body() {
        let body = request(3).body();
        assert_eq!(body.stock_symbol, "AAPL");
        assert_eq!(body.analysis_type, AnalysisMode::CompleteAnalysis);
    }
}
