//! CLI entrypoint for the sofile conformance harness.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sofile_harness::structured_log::{ArtifactIndex, LogEmitter, validate_log_file};
use sofile_harness::{ScenarioRunner, catalog, tools};

/// Conformance tooling for sofile streams.
#[derive(Debug, Parser)]
#[command(name = "sofile-harness")]
#[command(about = "Conformance harness for sofile streams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the scenario matrix.
    Run {
        /// Only run scenarios whose name contains this text.
        #[arg(long)]
        filter: Option<String>,
        /// Structured JSONL log path (stdout if omitted).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Output JSON report path.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Output artifact index path (hashes the log and report).
        #[arg(long)]
        artifact_index: Option<PathBuf>,
        /// Run identifier used in trace ids.
        #[arg(long, default_value = "local")]
        run_id: String,
        /// Directory for scenario scratch files.
        #[arg(long)]
        scratch: Option<PathBuf>,
    },
    /// List scenarios.
    List,
    /// Copy a file byte-by-byte through two streams.
    Copy { src: PathBuf, dst: PathBuf },
    /// Run a shell command and echo its output through a pipe stream.
    Spawn { command: String },
    /// Validate a structured JSONL log.
    ValidateLog { path: PathBuf },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            filter,
            log,
            report,
            artifact_index,
            run_id,
            scratch,
        } => {
            let scratch = scratch.unwrap_or_else(|| std::env::temp_dir().join("sofile-harness"));
            let runner = ScenarioRunner::new(&run_id, scratch).with_filter(filter);
            let mut emitter = match &log {
                Some(path) => LogEmitter::to_file(path, &run_id)?,
                None => LogEmitter::to_stdout(&run_id),
            };
            let all = catalog();
            let run = runner.run(&all, &mut emitter)?;
            drop(emitter);

            eprintln!(
                "Run complete: total={}, passed={}, failed={}",
                run.total, run.passed, run.failed
            );

            if let Some(path) = &report {
                std::fs::write(path, run.to_json()?)?;
                eprintln!("Report written to {}", path.display());
            }
            if let Some(index_path) = &artifact_index {
                let mut index = ArtifactIndex::new(&run_id);
                if let Some(path) = &log {
                    index.add_file(path, "log")?;
                }
                if let Some(path) = &report {
                    index.add_file(path, "report")?;
                }
                std::fs::write(index_path, index.to_json()?)?;
                eprintln!("Artifact index written to {}", index_path.display());
            }

            if !run.all_passed() {
                return Err(format!("{} scenario(s) failed", run.failed).into());
            }
        }
        Command::List => {
            for scenario in catalog() {
                println!("{:<28} {:<11} {}", scenario.name, scenario.operation, scenario.summary);
            }
        }
        Command::Copy { src, dst } => {
            let copied = tools::copy_file(&src, &dst)?;
            eprintln!("Copied {copied} bytes {} -> {}", src.display(), dst.display());
        }
        Command::Spawn { command } => {
            let mut stdout = std::io::stdout().lock();
            let (bytes, status) = tools::spawn_echo(&command, &mut stdout)?;
            stdout.flush()?;
            eprintln!("{bytes} bytes, {status}");
            if !status.success() {
                std::process::exit(status.code().unwrap_or(1));
            }
        }
        Command::ValidateLog { path } => {
            let (lines, errors) = validate_log_file(&path)?;
            for err in &errors {
                eprintln!("{err}");
            }
            if !errors.is_empty() {
                return Err(format!("{} error(s) in {lines} line(s)", errors.len()).into());
            }
            eprintln!("{lines} line(s) valid");
        }
    }

    Ok(())
}
