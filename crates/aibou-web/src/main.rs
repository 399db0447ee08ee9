//! Serves the one-button Aibou trainer page.

use std::path::PathBuf;
use std::sync::Arc;

use aibou_core::config::TrainingConfig;
use aibou_web::{AppState, router};
use anyhow::Result;
use clap::Parser;
use tracing::info;

/// CLI arguments
#[derive(Parser)]
#[command(name = "aibou-web")]
#[command(about = "One-button web form for fine-tuning the Aibou chatbot")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:7860")]
    listen: String,

    /// JSONL file of {"prompt", "response"} records
    #[arg(long, default_value = "training_data.jsonl")]
    data: PathBuf,

    /// Directory holding the pretrained model snapshot
    #[arg(long, default_value = "models/flan-t5-base")]
    model: PathBuf,

    /// Artifact directory; its existence marks the run as done
    #[arg(long, default_value = "pal-chatbot-trained")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let state = Arc::new(AppState::new(
        cli.data,
        cli.model,
        cli.output,
        TrainingConfig::default(),
    ));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("listening on http://{}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
