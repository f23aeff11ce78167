use anyhow::Context;
use clap::Parser;
use geoweather_processor::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).await.context("weather processing failed")
}
