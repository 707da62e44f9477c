mod assessment;
mod auth;
mod cli;
mod error;
mod github;
mod llm;
mod models;
mod prompt;
mod server;
mod tools;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting ghassess - GitHub profile assessments");
    cli.execute().await?;

    Ok(())
}
