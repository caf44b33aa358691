//! Analysis request controller
//!
//! Turns a symbol/mode pair into one POST to the analysis service and tracks
//! the request through `Idle -> Loading -> Success | Failed`. The state lives
//! in a `watch` channel; the presentation layer subscribes and only ever sees
//! whole-value snapshots.
//!
//! Every submit takes the next sequence number. A state write is applied only
//! while its sequence number is still the latest issued, so a slow reply for
//! an older submit can never overwrite a newer one.

use crate::api::parse_reply;
use crate::error::{AnalysisError, Result};
use crate::input::{AnalysisForm, AnalysisMode, normalize_symbol};
use crate::state::{AnalysisRequest, RequestState};
use crate::transport::{AnalysisTransport, Route};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Result of a single `submit` call
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// Terminal state computed for this submit
    pub state: RequestState,
    /// False when a newer submit superseded this one
    pub applied: bool,
}

/// Owns the request state and issues analysis requests
pub struct AnalysisController {
    transport: Arc<dyn AnalysisTransport>,
    state: watch::Sender<RequestState>,
    latest_seq: AtomicU64,
}

impl AnalysisController {
    pub fn new(transport: Arc<dyn AnalysisTransport>) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            transport,
            state,
            latest_seq: AtomicU64::new(0),
        }
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    /// Sequence number of the most recent submit
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq.load(Ordering::SeqCst)
    }

    /// Submit the form's current symbol and mode
    pub async fn submit_form(&self, form: &AnalysisForm) -> SubmitOutcome {
        self.submit(&form.symbol, form.mode).await
    }

    /// Validate, send, and record the outcome of one analysis request
    ///
    /// An empty symbol fails immediately without touching the network. Any
    /// other input yields exactly one terminal outcome; `Loading` is applied
    /// before the request goes out.
    pub async fn submit(&self, raw_symbol: &str, mode: AnalysisMode) -> SubmitOutcome {
        let seq = self.next_seq();
        let symbol = normalize_symbol(raw_symbol);

        if symbol.is_empty() {
            return self.finish(
                seq,
                RequestState::Failed {
                    request: None,
                    error: AnalysisError::EmptySymbol,
                },
            );
        }

        let request = AnalysisRequest { seq, symbol, mode };
        info!("Requesting {} for {} (#{})", mode, request.symbol, seq);
        self.apply(
            seq,
            RequestState::Loading {
                request: request.clone(),
            },
        );

        let next = match self.fetch(&request).await {
            Ok(markdown) => {
                info!(
                    "Received {} bytes of analysis for {}",
                    markdown.len(),
                    request.symbol
                );
                RequestState::Success {
                    request,
                    markdown,
                    received_at: Utc::now(),
                }
            }
            Err(error) => {
                warn!("Analysis for {} failed: {}", request.symbol, error);
                RequestState::Failed {
                    request: Some(request),
                    error,
                }
            }
        };

        self.finish(seq, next)
    }

    fn next_seq(&self) -> u64 {
        self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn fetch(&self, request: &AnalysisRequest) -> Result<String> {
        let sent = request.body();
        let body = serde_json::to_value(&sent)?;
        let reply = self.transport.post_json(Route::Analyze, body).await?;
        debug!("Analyze reply: {}", reply.status_line());
        let envelope = parse_reply(&reply)?;
        if !envelope.echoes(&sent) {
            warn!(
                "Reply is for {:?}/{:?}, requested {}/{}",
                envelope.stock_symbol, envelope.analysis_type, sent.stock_symbol, sent.analysis_type
            );
        }
        envelope.into_markdown()
    }

    fn finish(&self, seq: u64, state: RequestState) -> SubmitOutcome {
        let applied = self.apply(seq, state.clone());
        if !applied {
            debug!(
                "Discarding stale outcome for #{} (latest is #{})",
                seq,
                self.latest_seq()
            );
        }
        SubmitOutcome { state, applied }
    }

    /// Replace the state if `seq` is still the latest submit
    fn apply(&self, seq: u64, next: RequestState) -> bool {
        self.state.send_if_modified(|current| {
            if self.latest_seq.load(Ordering::SeqCst) == seq {
                *current = next;
                true
            } else {
                false
            }
        })
    }
}
