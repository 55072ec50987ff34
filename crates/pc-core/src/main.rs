//! pc-capture: inspect what the capture core would record in this process.
//!
//! Commands print to stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use pc_config::CaptureConfig;
use pc_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use pc_core::rows::fields_from_json;
use pc_core::{charset, CaptureRuntime, CoreError, ResultCapture, RowSerializer};
use serde_json::Value;
use std::io::Read;
use std::process::ExitCode;

/// Payload capture diagnostics
#[derive(Parser)]
#[command(name = "pc-capture")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Minimum log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the scrubbed process.environ value for this process
    Env,

    /// Print the charset resolved from a Content-Type header
    Charset {
        /// Header value, e.g. "text/html; charset=UTF-16"
        content_type: String,
    },

    /// Print the resolved capture configuration as JSON
    Config,

    /// Serialize a JSON array of row objects within a length budget
    Rows {
        /// Per-row character budget (defaults to the configured budget)
        #[arg(long)]
        budget: Option<usize>,

        /// JSON array of objects, or "-" to read stdin
        input: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(cli.log_level, cli.log_format));

    match run(cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<String, CoreError> {
    match command {
        Commands::Env => Ok(CaptureRuntime::from_env().process_environment().to_string()),
        Commands::Charset { content_type } => {
            Ok(charset::resolve_name(Some(&content_type)).to_string())
        }
        Commands::Config => Ok(serde_json::to_string_pretty(&CaptureConfig::from_env())?),
        Commands::Rows { budget, input } => {
            let budget = budget.unwrap_or_else(|| CaptureConfig::from_env().row_max_length);
            let raw = if input == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                input
            };
            serialize_rows(&raw, budget)
        }
    }
}

fn serialize_rows(raw: &str, budget: usize) -> Result<String, CoreError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(rows) = value else {
        return Err(CoreError::RowInput("expected a JSON array of objects".to_string()));
    };

    let mut capture = ResultCapture::new(RowSerializer::new(budget));
    for row in &rows {
        capture.push_row(&fields_from_json(row)?);
    }
    Ok(capture.render())
}
