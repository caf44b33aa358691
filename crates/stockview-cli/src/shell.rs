//! Interactive analysis shell
//!
//! Owns the input form and wires parsed commands to the analysis controller
//! and the assistant session. While a request is in flight the shell watches
//! the controller state and reports progress.

use crate::commands::{Command, CommandError};
use crate::formatter::{Formatter, loading_line};
use std::sync::Arc;
use stockview_client::{
    AnalysisController, AnalysisForm, AnalysisMode, AnalysisTransport, ChatSession, ClientConfig,
    POPULAR_SYMBOLS, SUGGESTED_QUESTIONS, SubmitOutcome,
};
use tracing::debug;

/// Result of processing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Exit,
}

type ProgressFn = Box<dyn Fn(&str) + Send + Sync>;

pub struct Shell {
    controller: AnalysisController,
    chat: ChatSession,
    form: AnalysisForm,
    formatter: Box<dyn Formatter>,
    on_progress: ProgressFn,
}

impl Shell {
    pub fn new(
        transport: Arc<dyn AnalysisTransport>,
        config: &ClientConfig,
        formatter: Box<dyn Formatter>,
    ) -> Self {
        Self {
            controller: AnalysisController::new(transport.clone()),
            chat: ChatSession::with_max_history(transport, config.max_chat_history),
            form: AnalysisForm::default(),
            formatter,
            on_progress: Box::new(|line| eprintln!("{line}")),
        }
    }

    /// Replace the progress sink (stderr by default)
    pub fn with_progress(mut self, on_progress: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_progress = Box::new(on_progress);
        self
    }

    pub fn form(&self) -> &AnalysisForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut AnalysisForm {
        &mut self.form
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Prompt showing the current mode
    pub fn prompt(&self) -> String {
        format!("[{}] > ", self.form().mode)
    }

    /// View of the current controller state
    pub fn current_view(&self) -> String {
        self.formatter.format_state(&self.controller.state())
    }

    /// Process user input and return a response
    pub async fn process_input(&mut self, input: &str) -> Result<Reply, CommandError> {
        let command = Command::parse(input)?;
        Ok(self.execute_command(command).await)
    }

    /// Execute a parsed command
    pub async fn execute_command(&mut self, command: Command) -> Reply {
        debug!("Executing: {}", command.description());
        match command {
            Command::Submit { symbol } => self.analyze(symbol, None).await,
            Command::Analyze { symbol } => {
                self.analyze(symbol, Some(AnalysisMode::CompleteAnalysis))
                    .await
            }
            Command::News { symbol } => self.analyze(symbol, Some(AnalysisMode::NewsImpact)).await,
            Command::Mode { mode: None } => Reply::Output(format!(
                "Current mode: {} (available: {})",
                self.form.mode,
                AnalysisMode::ALL.map(AnalysisMode::as_str).join(", ")
            )),
            Command::Mode { mode: Some(mode) } => {
                self.form.set_mode(mode);
                Reply::Output(format!("Mode set to {mode}"))
            }
            Command::Ask { question } => Reply::Output(self.ask(&question).await),
            Command::Popular { pick: None } => Reply::Output(popular_list()),
            Command::Popular { pick: Some(pick) } => {
                match pick.checked_sub(1).and_then(|i| POPULAR_SYMBOLS.get(i)) {
                    Some(symbol) => self.analyze((*symbol).to_string(), None).await,
                    None => Reply::Output(self.formatter.format_error(&format!(
                        "Pick a number between 1 and {}",
                        POPULAR_SYMBOLS.len()
                    ))),
                }
            }
            Command::Suggest { pick: None } => Reply::Output(suggestion_list()),
            Command::Suggest { pick: Some(pick) } => {
                match pick.checked_sub(1).and_then(|i| SUGGESTED_QUESTIONS.get(i)) {
                    Some(question) => Reply::Output(self.ask(question).await),
                    None => Reply::Output(self.formatter.format_error(&format!(
                        "Pick a number between 1 and {}",
                        SUGGESTED_QUESTIONS.len()
                    ))),
                }
            }
            Command::History => Reply::Output(self.history_text()),
            Command::Clear => {
                self.chat.clear();
                Reply::Output("Assistant history cleared.".to_string())
            }
            Command::Help => Reply::Output(Command::help_text().to_string()),
            Command::Exit => Reply::Exit,
        }
    }

    /// Put `symbol` (and optionally `mode`) into the form and submit it
    async fn analyze(&mut self, symbol: String, mode: Option<AnalysisMode>) -> Reply {
        self.form.set_symbol(symbol);
        if let Some(mode) = mode {
            self.form.set_mode(mode);
        }
        let outcome = self.submit_form().await;
        Reply::Output(self.formatter.format_state(&outcome.state))
    }

    /// Submit the form, reporting `Loading` through the progress sink
    pub async fn submit_form(&self) -> SubmitOutcome {
        let mut state_rx = self.controller.subscribe();
        state_rx.mark_unchanged();

        let form = self.form.snapshot();
        let submit = self.controller.submit_form(&form);
        tokio::pin!(submit);

        loop {
            tokio::select! {
                biased;
                outcome = &mut submit => return outcome,
                Ok(()) = state_rx.changed() => {
                    let state = state_rx.borrow_and_update().clone();
                    if let Some(request) = state.request().filter(|_| state.is_loading()) {
                        (self.on_progress)(&loading_line(request));
                    }
                }
            }
        }
    }

    async fn ask(&mut self, question: &str) -> String {
        match self.chat.ask(question).await {
            Ok(_) => match self.chat.history().back() {
                Some(turn) => self.formatter.format_answer(turn),
                None => String::new(),
            },
            Err(e) => self.formatter.format_error(&e.to_string()),
        }
    }

    fn history_text(&self) -> String {
        let chat = self.chat();
        if chat.is_empty() {
            return "No questions asked yet. Use /ask <question>.".to_string();
        }
        let lines: Vec<String> = chat
            .history()
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                format!(
                    "{:>3}. [{}] {}",
                    i + 1,
                    turn.asked_at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                    turn.question
                )
            })
            .collect();
        format!("Assistant history:\n{}", lines.join("\n"))
    }
}

fn popular_list() -> String {
    let lines: Vec<String> = POPULAR_SYMBOLS
        .iter()
        .enumerate()
        .map(|(i, symbol)| format!("  {}. {symbol}", i + 1))
        .collect();
    format!(
        "Popular stocks:\n{}\nUse /popular <n> to analyze one.",
        lines.join("\n")
    )
}

fn suggestion_list() -> String {
    let lines: Vec<String> = SUGGESTED_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, question)| format!("  {}. {question}", i + 1))
        .collect();
    format!(
        "Try asking about:\n{}\nUse /suggest <n> to ask one.",
        lines.join("\n")
    )
}
