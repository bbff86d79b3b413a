//! aiflow binary: runs a graph layout against the simulated agent and prints the result.

use std::path::PathBuf;
use std::process::ExitCode;

use aiflow::context::ContextStatus;
use aiflow::graph::NodeResult;
use aiflow_cli::{registry, run_with_options, RunOptions};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aiflow")]
#[command(about = "Run AI node graphs from JSON layouts")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a layout and tick it until it finishes or the tick limit is hit.
    Run {
        /// Path to the JSON layout.
        layout: PathBuf,
        /// Step period in milliseconds (default 100, or AIFLOW_TICK_MS).
        #[arg(long, value_name = "MS")]
        tick_ms: Option<u64>,
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Overrides the layout's seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Agent tags, comma separated.
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        agent: Option<String>,
        /// Print every context event.
        #[arg(short, long)]
        verbose: bool,
    },
    /// List the node kinds a layout may use.
    Kinds,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,aiflow=debug,aiflow_cli=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match args.command {
        Command::Kinds => {
            for kind in registry().kinds() {
                println!("{}", kind);
            }
            ExitCode::SUCCESS
        }
        Command::Run {
            layout,
            tick_ms,
            max_ticks,
            seed,
            tags,
            agent,
            verbose,
        } => {
            init_tracing(verbose);
            let options = RunOptions {
                tick_ms,
                max_ticks,
                seed,
                tags,
                agent,
                verbose,
            };
            let report = match run_with_options(&layout, &options).await {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::from(2);
                }
            };

            for fault in &report.faults {
                eprintln!("fault in {} (generation {}): {}", fault.name, fault.generation, fault.fault);
            }
            if !report.blackboard.is_empty() {
                println!("blackboard:");
                for (key, value) in report.blackboard.iter() {
                    println!("  {} = {}", key, value);
                }
            }
            match report.status {
                ContextStatus::Finished(NodeResult::Success) => {
                    println!("finished: success");
                    ExitCode::SUCCESS
                }
                ContextStatus::Finished(NodeResult::Failure) => {
                    println!("finished: failure");
                    ExitCode::from(1)
                }
                ContextStatus::Running => {
                    println!("tick limit reached");
                    ExitCode::from(2)
                }
                ContextStatus::Cancelled => {
                    println!("cancelled");
                    ExitCode::from(2)
                }
            }
        }
    }
}
