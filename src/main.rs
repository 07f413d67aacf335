use anyhow::Result;
use clap::Parser;
use eksrefresh::{Cli, Commands};
use tracing_log::AsTrace;

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  tracing_subscriber::fmt()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .without_time()
    .init();

  match &cli.commands {
    Commands::Inventory(args) => eksrefresh::inventory(args).await?,
    Commands::Cordon(args) => eksrefresh::cordon(args).await?,
    Commands::Drain(args) => eksrefresh::drain(args).await?,
    Commands::Lookup(args) => eksrefresh::lookup(args).await?,
  }

  Ok(())
}
