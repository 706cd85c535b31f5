//! CLI entrypoint for the fpos_t bridge harness.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fposbridge_core::record_layout;
use fposbridge_harness::structured_log::{LogEmitter, validate_log_file};
use fposbridge_harness::{HarnessError, run_smoke};
use fposbridge_membrane::BridgeMode;

/// Smoke-test tooling for the fpos_t bridge.
#[derive(Debug, Parser)]
#[command(name = "fposbridge-harness")]
#[command(about = "Smoke-test harness for the fpos_t bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the greeting to stdout (exactly `Hello, world!`, no newline).
    Greet,
    /// Run the allocate/populate/copy/release scenario.
    Smoke {
        /// Structured JSONL log output path (stderr if omitted).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Runtime mode (`strict` or `hardened`).
        #[arg(long, default_value = "strict")]
        mode: String,
    },
    /// Read a file up to a delimiter, then to the end, using saved positions.
    Read {
        #[arg(long)]
        path: PathBuf,
        /// Delimiter byte; 0 reads to end of file.
        #[arg(long, default_value_t = b'n')]
        delim: u8,
    },
    /// Print the host fpos_t size and alignment as JSON.
    Layout,
    /// Validate a structured JSONL log.
    ValidateLog {
        #[arg(long)]
        log: PathBuf,
    },
}

fn run_id() -> String {
    format!("run-{}", std::process::id())
}

fn main() -> Result<(), HarnessError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Greet => fposbridge_abi::greet(),
        Command::Smoke { log, mode } => {
            let mode = BridgeMode::from_str_loose(&mode);
            let report = match log {
                Some(path) => {
                    let mut emitter = LogEmitter::to_file(&path, &run_id())?;
                    let report = run_smoke(&mut emitter, mode)?;
                    eprintln!("Smoke log written to {}", path.display());
                    report
                }
                None => run_smoke(&mut LogEmitter::to_stderr(&run_id()), mode)?,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.passed() {
                return Err(HarnessError::SmokeFailed(format!(
                    "copy_matches={} seek_matches={} leaked_handles={}",
                    report.copy_matches, report.seek_matches, report.leaked_handles
                )));
            }
        }
        Command::Read { path, delim } => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            fposbridge_harness::demo::run_read(&path, delim, &mut out)?;
            out.flush()?;
        }
        Command::Layout => {
            let layout = record_layout();
            let json = serde_json::json!({
                "size": layout.size,
                "align": layout.align,
                "host": layout.host,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if !errors.is_empty() {
                return Err(HarnessError::InvalidLog {
                    path: log.display().to_string(),
                    errors: errors.len(),
                });
            }
            eprintln!("{lines} line(s) valid in {}", log.display());
        }
    }

    Ok(())
}
