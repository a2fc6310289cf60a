use anyhow::Result;
use cigraph::cli::Cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    cigraph::output::print_banner();

    let cli = Cli::parse();
    info!("Starting cigraph - GitLab CI Pipeline Analyzer");
    cli.execute()?;

    Ok(())
}
