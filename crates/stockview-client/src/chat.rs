//! Assistant chat session
//!
//! Free-form questions go to `POST /chat` and come back in the same envelope
//! as an analysis. Answered turns are kept in memory for the session only.

use crate::api::{ChatRequestBody, interpret_reply};
use crate::error::{AnalysisError, Result};
use crate::transport::{AnalysisTransport, Route};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of turns kept
pub const MAX_HISTORY_SIZE: usize = 50;

/// Starter questions offered before the user types their own
pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "Investment tips",
    "Crypto market outlook",
    "How do interest rates affect stocks?",
];

/// One answered question
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub question: String,
    /// Raw markdown answer
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(question: String, answer: String) -> Self {
        Self {
            question,
            answer,
            asked_at: Utc::now(),
        }
    }
}

/// Question/answer session against the assistant endpoint
pub struct ChatSession {
    transport: Arc<dyn AnalysisTransport>,
    history: VecDeque<ChatTurn>,
    max_history: usize,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn AnalysisTransport>) -> Self {
        Self::with_max_history(transport, MAX_HISTORY_SIZE)
    }

    /// Create with custom history size (at least one turn is kept)
    pub fn with_max_history(transport: Arc<dyn AnalysisTransport>, max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            transport,
            history: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Ask one question and return the markdown answer
    ///
    /// Failed questions are not recorded.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnalysisError::EmptyQuestion);
        }

        info!("Asking assistant ({} chars)", question.len());
        let body = serde_json::to_value(ChatRequestBody {
            user_question: question.to_string(),
        })?;
        let reply = self.transport.post_json(Route::Chat, body).await?;
        debug!("Chat reply: {}", reply.status_line());

        let answer = interpret_reply(&reply)?;
        self.push_turn(ChatTurn::new(question.to_string(), answer.clone()));
        Ok(answer)
    }

    fn push_turn(&mut self, turn: ChatTurn) {
        self.history.push_back(turn);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Answered turns, oldest first
    pub fn history(&self) -> &VecDeque<ChatTurn> {
        &self.history
    }

    /// Most recent `n` turns, newest first
    pub fn last_turns(&self, n: usize) -> Vec<&ChatTurn> {
        self.history.iter().rev().take(n).collect()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpReply;
    use crate::transport::MockAnalysisTransport;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn echo_transport() -> MockAnalysisTransport {
        let mut mock = MockAnalysisTransport::new();
        mock.expect_post_json()
            .withf(|route, _| *route == Route::Chat)
            .returning(|_, body| {
                let question = body["user_question"].as_str().unwrap_or_default();
                Ok(HttpReply::new(
                    200,
                    "OK",
                    json!({"status": "success", "data": format!("Answer: {question}")}).to_string(),
                ))
            });
        mock
    }

    #[tokio::test]
    async fn test_empty_question_sends_nothing() {
        let mut mock = MockAnalysisTransport::new();
        mock.expect_post_json().times(0);
        let mut session = ChatSession::new(Arc::new(mock));

        let err = assert_err!(session.ask("   ").await);
        assert_eq!(err.to_string(), "Please enter a question.");
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_ask_records_turn() {
        let mut session = ChatSession::new(Arc::new(echo_transport()));

        let answer = assert_ok!(session.ask("  Is AAPL overvalued?  ").await);
        assert_eq!(answer, "Answer: Is AAPL overvalued?");
        assert_eq!(session.len(), 1);
        assert_eq!(session.history()[0].question, "Is AAPL overvalued?");
        assert_eq!(session.history()[0].answer, answer);
    }

    #[tokio::test]
    async fn test_failed_question_is_not_recorded() {
        let mut mock = MockAnalysisTransport::new();
        mock.expect_post_json().times(1).returning(|_, _| {
            Ok(HttpReply::new(
                400,
                "Bad Request",
                r#"{"status":"error","message":"No question provided"}"#,
            ))
        });
        let mut session = ChatSession::new(Arc::new(mock));

        let err = assert_err!(session.ask("hello").await);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "No question provided");
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let mut session = ChatSession::with_max_history(Arc::new(echo_transport()), 2);

        for question in ["one", "two", "three"] {
            session.ask(question).await.unwrap();
        }

        let questions: Vec<_> = session.history().iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, ["two", "three"]);
        assert_eq!(session.last_turns(1)[0].question, "three");

        session.clear();
        assert!(session.is_empty());
    }
}
