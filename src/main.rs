mod cli;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Commands;

#[derive(Parser)]
#[command(name = "habitpet")]
#[command(about = "Grow a pet by keeping your daily habits", version)]
struct Cli {
    /// Directory holding config.json and user data
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    cli::run(cli.command, cli.data_dir, cli.date).await
}
