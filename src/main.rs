use anyhow::Result;
use clap::{Parser, Subcommand};
use clubwatch::commands::{check, quota, run};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clubwatch")]
#[command(about = "Watch a club page for boosts and item changes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to <config dir>/clubwatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring until interrupted
    Run,

    /// Probe the club page once
    Check,

    /// Show today's contribution quota
    Quota,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run => run::execute(config),
        Commands::Check => check::execute(config),
        Commands::Quota => quota::execute(config),
    }
}
