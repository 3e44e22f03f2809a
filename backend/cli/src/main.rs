mod analyze_cmd;
mod config_cmd;
mod detect_cmd;
mod display;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tagscan_config::{config_dir, config_file_path};

#[derive(Parser)]
#[command(name = "tagscan")]
#[command(about = "TagScan — read fire-extinguisher inspection tags with a vision model")]
#[command(version)]
struct Cli {
    /// Config file (default: $TAGSCAN_CONFIG_DIR/config.yaml or ~/.tagscan/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a structured record from a tag photograph
    Analyze {
        /// Image file (JPEG, PNG, GIF or WEBP)
        image: PathBuf,
        /// Pretty-print the record JSON
        #[arg(long)]
        pretty: bool,
        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },
    /// Report the detected image format of a file
    Detect {
        image: PathBuf,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: config_cmd::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Analyze {
            image,
            pretty,
            summary,
        } => analyze_cmd::run(&config_path, &image, pretty, summary).await,
        Commands::Detect { image } => detect_cmd::run(&config_path, &image).await,
        Commands::Config { action } => config_cmd::run(&config_path, action).await,
    }
}
