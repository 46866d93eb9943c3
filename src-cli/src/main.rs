use clap::Parser;
use sectorlens_cli::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sectorlens_cli::init_tracing();
    sectorlens_cli::run(Cli::parse()).await
}
