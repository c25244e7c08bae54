// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "skincam")]
#[command(about = "Camera capture front end for the skin-health advisor")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Use the synthetic test-pattern source instead of a real camera
    #[arg(long, global = true)]
    synthetic: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available capture devices
    List,

    /// Start the camera, grab one snapshot, and save it
    Snap {
        /// Camera facing: front or back
        #[arg(short, long, default_value = "front")]
        facing: String,

        /// Output file or directory (default: ~/Pictures/skincam/)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=skincam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Snap { facing, output }) => cli::snap(&facing, output, cli.synthetic),
        Some(Commands::List) | None => cli::list_devices(cli.synthetic),
    }
}
