//! Build blocker CLI tool.

use blocker_core::QueueItemId;
use blocker_scheduler::{Admission, QueryFailurePolicy};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "blocker")]
#[command(about = "Build blocker admission checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a job may start against a runtime snapshot
    Check {
        /// Path to the blocker configuration
        #[arg(long, default_value = "blocker.kdl")]
        config: String,
        /// Path to a JSON snapshot of running and queued jobs
        #[arg(long)]
        snapshot: String,
        /// Name of the candidate job
        #[arg(long)]
        job: String,
        /// Display name of the candidate job (defaults to its name)
        #[arg(long)]
        display_name: Option<String>,
        /// Queue item id of the candidate, if it is already queued
        #[arg(long)]
        item: Option<QueueItemId>,
        /// Admit the build when the runtime cannot be queried
        #[arg(long)]
        fail_open: bool,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a blocker configuration
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "blocker.kdl")]
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            config,
            snapshot,
            job,
            display_name,
            item,
            fail_open,
            json,
        } => {
            let policy = if fail_open {
                QueryFailurePolicy::FailOpen
            } else {
                QueryFailurePolicy::FailClosed
            };
            let admission =
                commands::check(&config, &snapshot, &job, display_name, item, policy)?;
            commands::print_admission(&admission, json)?;

            let code = match admission {
                Admission::Proceed => 0,
                Admission::Blocked(_) => 2,
                Admission::Deferred { .. } => 3,
            };
            std::process::exit(code);
        }
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
    }

    Ok(())
}
