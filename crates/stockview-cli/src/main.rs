//! stockview: terminal client for the stock analysis service
//!
//! # Usage
//!
//! ```bash
//! # Interactive shell against a local service
//! cargo run --bin stockview
//!
//! # One-shot news analysis as JSON
//! STOCKVIEW_API_URL=http://127.0.0.1:5001 cargo run --bin stockview -- --symbol tsla --mode news --json
//! ```

mod commands;
mod formatter;
mod shell;

use clap::Parser;
use shell::{Reply, Shell};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use stockview_client::{AnalysisMode, ClientConfig, HttpTransport, POPULAR_SYMBOLS, RequestState};
use stockview_utils::Config;
use tracing::info;

const DEFAULT_LOG_FILTER: &str = "warn,stockview_client=info";

#[derive(Parser, Debug)]
#[command(name = "stockview")]
#[command(about = "Request and read AI stock analyses from the terminal", long_about = None)]
struct Args {
    /// Analysis service base URL [env: STOCKVIEW_API_URL]
    #[arg(long)]
    api_url: Option<String>,

    /// Analysis mode: complete or news
    #[arg(short, long, default_value = "complete")]
    mode: AnalysisMode,

    /// Analyze this symbol once and exit instead of starting the shell
    #[arg(short, long)]
    symbol: Option<String>,

    /// Request timeout in seconds [env: STOCKVIEW_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn print_banner() {
    println!(
        r"
╔══════════════════════════════════════════════════════════════╗
║                     Stock Analysis                           ║
║                                                              ║
║  Type a symbol (e.g. AAPL) and press Enter to analyze it.    ║
║                                                              ║
║  Commands:                                                   ║
║    /news <symbol>     - News impact analysis                 ║
║    /mode <mode>       - complete | news                      ║
║    /ask <question>    - Ask the assistant                    ║
║    /suggest           - Suggested questions                  ║
║    /popular           - Popular stocks                       ║
║    /help              - Show help                            ║
║    /exit              - Exit                                 ║
╚══════════════════════════════════════════════════════════════╝
"
    );
}

fn build_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut builder = ClientConfig::builder().with_env();
    if let Some(url) = &args.api_url {
        builder = builder.api_base(url);
    }
    if let Some(secs) = args.timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let app = Config::from_env();
    if app.is_production() {
        stockview_utils::init_json_tracing(DEFAULT_LOG_FILTER);
    } else {
        stockview_utils::init_tracing_with_default(DEFAULT_LOG_FILTER);
    }

    let args = Args::parse();
    let config = build_config(&args)?;
    info!(
        "Starting {} ({}) against {}",
        app.app_name, app.environment, config.api_base
    );

    let transport = Arc::new(HttpTransport::new(config.clone())?);
    let mut shell = Shell::new(transport, &config, formatter::formatter_for(args.json));
    shell.form_mut().set_mode(args.mode);

    if let Some(symbol) = args.symbol {
        shell.form_mut().set_symbol(symbol);
        let outcome = shell.submit_form().await;
        println!("{}", shell.current_view());
        return Ok(match outcome.state {
            RequestState::Success { .. } => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        });
    }

    run_repl(&mut shell, &config).await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_repl(shell: &mut Shell, config: &ClientConfig) -> anyhow::Result<()> {
    print_banner();

    println!("Configuration:");
    println!("  API Base: {}", config.api_base);
    println!("  Popular: {}", POPULAR_SYMBOLS.join(", "));
    println!();
    println!("{}\n", shell.current_view());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", shell.prompt());
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                // EOF
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match shell.process_input(input).await {
            Ok(Reply::Output(text)) => println!("{text}\n"),
            Ok(Reply::Exit) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    Ok(())
}
