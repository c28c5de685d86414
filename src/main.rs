// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vision_ai::CameraMode;
use vision_ai::config::Config;
use vision_ai::constants::app_info;

mod cli;

#[derive(Parser)]
#[command(name = "vision-ai")]
#[command(about = "Identify objects with your camera and a multimodal model")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/vision-ai/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Camera facing direction
    #[arg(short, long, global = true, value_enum)]
    facing: Option<Facing>,

    /// Use an image file instead of a camera
    #[arg(short, long, global = true)]
    image: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive terminal front end (default)
    Terminal,

    /// List available cameras
    List,

    /// Capture once, identify and print the result
    Identify {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Facing {
    /// Front-facing camera
    User,
    /// Rear-facing camera
    Environment,
}

impl From<Facing> for CameraMode {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::User => CameraMode::User,
            Facing::Environment => CameraMode::Environment,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=vision_ai=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(facing) = cli.facing {
        config.camera_mode = facing.into();
    }

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Identify { json }) => cli::identify(&config, cli.image, json),
        Some(Commands::Terminal) | None => vision_ai::terminal::run(config, cli.image),
    }
}
