//! Stock analysis client for stockview
//!
//! This crate talks to the stock analysis service and tracks each request from
//! submit to result. It includes:
//!
//! - The symbol/mode input holder (`AnalysisForm`, `AnalysisMode`)
//! - Wire types and reply validation for `/analyze` and `/chat`
//! - A reqwest transport behind the `AnalysisTransport` trait
//! - The `AnalysisController`, which owns the `RequestState` and publishes it
//!   through a `watch` channel
//! - A `ChatSession` for free-form questions to the assistant
//!
//! Successful results are kept as raw markdown; render them with
//! [`RequestState::render`].
//!
//! # Example
//!
//! ```rust,ignore
//! use stockview_client::{AnalysisController, AnalysisMode, ClientConfig, HttpTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = HttpTransport::new(ClientConfig::from_env()?)?;
//!     let controller = AnalysisController::new(Arc::new(transport));
//!
//!     let outcome = controller.submit("aapl", AnalysisMode::CompleteAnalysis).await;
//!     if let Some(doc) = outcome.state.render() {
//!         println!("{}", doc.plain_text());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod state;
pub mod transport;

// Re-export main types for convenience
pub use api::{AnalysisEnvelope, AnalysisRequestBody, ChatRequestBody, HttpReply, interpret_reply, parse_reply};
pub use chat::{ChatSession, ChatTurn, SUGGESTED_QUESTIONS};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_API_BASE};
pub use controller::{AnalysisController, SubmitOutcome};
pub use error::{AnalysisError, Result};
pub use input::{AnalysisForm, AnalysisMode, POPULAR_SYMBOLS, normalize_symbol};
pub use state::{AnalysisRequest, RequestState};
pub use transport::{AnalysisTransport, HttpTransport, Route};
