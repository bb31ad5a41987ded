//! faceid - enroll face embeddings into a gallery and verify queries against it.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{EnrollCommand, InfoCommand, RevokeCommand, VerifyCommand};

/// Face embedding gallery tool.
///
/// A gallery is a directory holding `embeddings.bin` and `identities.jsonl`.
/// Input files (`-f`) may be YAML or JSON, chosen by extension.
#[derive(Parser)]
#[command(name = "faceid")]
#[command(about = "Face embedding enrollment and verification")]
#[command(version)]
pub struct Cli {
    /// Service config file (.yaml, .yml or .json)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add identities to a gallery, creating it if absent
    Enroll(EnrollCommand),
    /// Identify query embeddings against a gallery
    Verify(VerifyCommand),
    /// Show gallery dimension and size
    Info(InfoCommand),
    /// Tombstone one gallery entry
    Revoke(RevokeCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Enroll(cmd) => cmd.run(&cli),
        Commands::Verify(cmd) => cmd.run(&cli),
        Commands::Info(cmd) => cmd.run(&cli),
        Commands::Revoke(cmd) => cmd.run(&cli),
    }
}
