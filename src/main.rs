// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use photobooth::Config;
use photobooth::backends::camera::CameraSourceType;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Unattended photo booth kiosk")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings that override the config file
#[derive(Args)]
struct Overrides {
    /// Config file (default: ~/.config/photobooth/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Gallery backend base URL
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Camera source
    #[arg(long, global = true, value_enum)]
    source: Option<CameraSourceType>,

    /// Camera device (PipeWire node/serial or /dev/videoN)
    #[arg(long, global = true)]
    device: Option<String>,

    /// Photos per run
    #[arg(long, global = true)]
    photos: Option<u32>,

    /// Countdown seconds before each photo
    #[arg(long, global = true)]
    countdown: Option<u32>,

    /// Timeout for each backend request, in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive kiosk (default)
    Kiosk,

    /// Take one set of photos and print the links
    Snap,

    /// Capture a single still to disk to check the camera
    Probe {
        /// Output file path (default: ./photo_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Overrides {
    fn resolve(self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load(),
        };

        if let Some(url) = self.backend_url {
            config.backend_url = url;
        }
        if let Some(source) = self.source {
            config.camera_source = source;
        }
        if self.device.is_some() {
            config.device_path = self.device;
        }
        if let Some(photos) = self.photos {
            config.photo_count = photos;
        }
        if let Some(countdown) = self.countdown {
            config.countdown_seconds = countdown;
        }
        if self.timeout.is_some() {
            config.network_timeout_secs = self.timeout;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli.overrides.resolve()?;

    match cli.command {
        Some(Commands::Kiosk) | None => cli::run_kiosk(config),
        Some(Commands::Snap) => cli::snap(config),
        Some(Commands::Probe { output }) => cli::probe(config, output),
    }
}
