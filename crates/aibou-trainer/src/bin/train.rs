//! Aibou training CLI.

use std::path::PathBuf;

use aibou_core::config::TrainingConfig;
use aibou_trainer::fetch::{DEFAULT_HUB_URL, fetch_pretrained};
use aibou_trainer::orchestrator::{CandleBackend, Orchestrator, Outcome};
use aibou_trainer::status::LogSink;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

/// CLI arguments
#[derive(Parser)]
#[command(name = "aibou-train")]
#[command(about = "Fine-tune a seq2seq chatbot on prompt/response pairs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a training pass (no-op if the output directory exists)
    Run {
        /// JSONL file of {"prompt", "response"} records
        #[arg(short, long, default_value = "training_data.jsonl")]
        data: PathBuf,

        /// Directory holding the pretrained model snapshot
        #[arg(short, long, default_value = "models/flan-t5-base")]
        model: PathBuf,

        /// Artifact directory; its existence marks the run as done
        #[arg(short, long, default_value = "pal-chatbot-trained")]
        output: PathBuf,

        /// Override the number of epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Override the batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Download a pretrained snapshot from the Hugging Face hub
    Fetch {
        /// Repository id, e.g. google/flan-t5-base
        #[arg(default_value = "google/flan-t5-base")]
        repo: String,

        /// Destination directory
        #[arg(short, long, default_value = "models/flan-t5-base")]
        dest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            model,
            output,
            epochs,
            batch_size,
        } => {
            let mut config = TrainingConfig::default();
            if let Some(epochs) = epochs {
                config.epochs = epochs;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }

            let backend = CandleBackend::auto()?;
            let orchestrator = Orchestrator::new(data, model, output, config);
            let outcome =
                tokio::task::spawn_blocking(move || orchestrator.run(&backend, &LogSink)).await??;

            match outcome {
                Outcome::AlreadyTrained => info!("nothing to do"),
                Outcome::Trained {
                    elapsed_secs,
                    report,
                } => info!(
                    "finished {} steps in {elapsed_secs:.2}s, final loss {:.4}",
                    report.steps, report.final_loss
                ),
            }
        }
        Commands::Fetch { repo, dest } => {
            fetch_pretrained(DEFAULT_HUB_URL, &repo, &dest).await?;
        }
    }

    Ok(())
}
