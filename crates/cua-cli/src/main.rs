//! cua: Closed-loop computer use agent over OmniParser and a local LLM.

mod agent;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cua")]
#[command(about = "Closed-loop computer use agent", version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute a task against the live screen
    Run {
        /// The task to perform, in natural language
        task: Vec<String>,

        /// Maximum capture/act cycles (overrides config)
        #[arg(short, long)]
        max_steps: Option<usize>,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show backing service status and effective settings
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            task,
            max_steps,
            json,
        } => {
            let task_text = task.join(" ");
            if task_text.trim().is_empty() {
                anyhow::bail!("no task given; usage: cua run <task>");
            }
            commands::run(&task_text, max_steps, json).await
        }
        Commands::Status => commands::status().await,
    }
}
