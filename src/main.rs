//! Binary crate for the `weather-etl` command-line tool.

use clap::Parser;
use env_logger::Env;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
