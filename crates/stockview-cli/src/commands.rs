//! Command parsing for the interactive shell
//!
//! A line starting with `/` is a command; anything else is a stock symbol to
//! analyze with the current mode.

use stockview_client::AnalysisMode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty input")]
    Empty,

    #[error("Missing {what} for /{command}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Bare symbol, analyzed with the current mode
    Submit { symbol: String },
    /// Complete analysis of a symbol
    Analyze { symbol: String },
    /// News impact analysis of a symbol
    News { symbol: String },
    /// Show (`None`) or change the current mode
    Mode { mode: Option<AnalysisMode> },
    /// Free-form question to the assistant
    Ask { question: String },
    /// List quick-pick symbols, or analyze one by its number
    Popular { pick: Option<usize> },
    /// List suggested questions, or ask one by its number
    Suggest { pick: Option<usize> },
    /// Show assistant history
    History,
    /// Clear assistant history
    Clear,
    Help,
    Exit,
}

impl Command {
    /// Parse a command from user input
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(CommandError::Empty);
        }

        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Submit {
                symbol: input.to_string(),
            });
        };

        let (cmd, args) = match rest.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd.to_lowercase(), args.trim()),
            None => (rest.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "analyze" | "a" => Ok(Command::Analyze {
                symbol: required(args, "analyze", "symbol")?,
            }),
            "news" | "n" => Ok(Command::News {
                symbol: required(args, "news", "symbol")?,
            }),
            "mode" | "m" => {
                if args.is_empty() {
                    return Ok(Command::Mode { mode: None });
                }
                let mode = args
                    .parse::<AnalysisMode>()
                    .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
                Ok(Command::Mode { mode: Some(mode) })
            }
            "ask" | "chat" | "?" => Ok(Command::Ask {
                question: required_text(args, "ask", "question")?,
            }),
            "popular" | "p" => Ok(Command::Popular {
                pick: list_number(args)?,
            }),
            "suggest" | "ideas" | "s" => Ok(Command::Suggest {
                pick: list_number(args)?,
            }),
            "history" | "hist" => Ok(Command::History),
            "clear" | "cls" => Ok(Command::Clear),
            "help" | "h" => Ok(Command::Help),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            "" => Err(CommandError::Unknown(String::new())),
            _ => Err(CommandError::Unknown(cmd)),
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        r"
Stock Analysis Commands
=======================

Analysis:
  <symbol>               Analyze a symbol with the current mode
  /analyze <symbol>      Complete analysis
  /news <symbol>         News impact analysis
  /mode [complete|news]  Show or change the current mode
  /popular [n]           List popular symbols, or analyze number n

Assistant:
  /ask <question>        Ask the assistant a question
  /suggest [n]           List suggested questions, or ask number n
  /history               Show questions asked this session
  /clear                 Clear assistant history

Other:
  /help                  Show help
  /exit                  Exit

Aliases:
  /a = /analyze   /n = /news   /m = /mode   /p = /popular
  /? = /ask       /s = /suggest   /q = /exit
"
    }

    /// Short description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Command::Submit { .. } => "Analyze with current mode",
            Command::Analyze { .. } => "Complete analysis",
            Command::News { .. } => "News impact analysis",
            Command::Mode { .. } => "Analysis mode",
            Command::Ask { .. } => "Ask the assistant",
            Command::Popular { .. } => "Popular symbols",
            Command::Suggest { .. } => "Suggested questions",
            Command::History => "Assistant history",
            Command::Clear => "Clear assistant history",
            Command::Help => "Show help",
            Command::Exit => "Exit",
        }
    }
}

/// First whitespace-separated argument
fn required(args: &str, command: &'static str, what: &'static str) -> Result<String, CommandError> {
    args.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(CommandError::MissingArgument { command, what })
}

/// Optional 1-based list number
fn list_number(args: &str) -> Result<Option<usize>, CommandError> {
    if args.is_empty() {
        return Ok(None);
    }
    args.parse::<usize>()
        .map(Some)
        .map_err(|_| CommandError::InvalidArgument(format!("Not a list number: {args}")))
}

/// The whole argument text
fn required_text(
    args: &str,
    command: &'static str,
    what: &'static str,
) -> Result<String, CommandError> {
    if args.is_empty() {
        Err(CommandError::MissingArgument { command, what })
    } else {
        Ok(args.to_string())
    }
}
