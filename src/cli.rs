// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the booth
//!
//! This module provides command-line functionality for:
//! - Running the interactive terminal kiosk
//! - Taking one set of photos non-interactively
//! - Probing the camera with a single still

use photobooth::api::BackendClient;
use photobooth::backends::camera::CameraManager;
use photobooth::booth::{BoothError, BoothSnapshot, CaptureOptions, CaptureOrchestrator, Stage};
use photobooth::constants::timing;
use photobooth::pipelines::photo::PhotoEncoder;
use photobooth::{AppError, Config};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// A key press in the kiosk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KioskCommand {
    TakePhotos,
    Retake,
    Cancel,
    Quit,
    Help,
}

impl KioskCommand {
    fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "t" | "take" => KioskCommand::TakePhotos,
            "r" | "retake" => KioskCommand::Retake,
            "c" | "cancel" => KioskCommand::Cancel,
            "q" | "quit" | "exit" => KioskCommand::Quit,
            _ => KioskCommand::Help,
        }
    }
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn build_booth(config: &Config) -> Arc<CaptureOrchestrator> {
    let client = Arc::new(BackendClient::new(config.backend_url.as_str()));
    Arc::new(CaptureOrchestrator::new(
        CameraManager::new(config),
        client.clone(),
        client.clone(),
        client,
        CaptureOptions::from(config),
    ))
}

/// Cancel `token` on Ctrl-C
fn install_ctrlc(token: CancellationToken) -> CliResult {
    ctrlc::set_handler(move || {
        debug!("Ctrl-C received");
        token.cancel();
    })?;
    Ok(())
}

fn print_help() {
    println!("  [Enter] take photos   [r] retake   [c] cancel   [q] quit");
}

/// One-line-per-change rendering of the booth state
fn render(snapshot: &BoothSnapshot) {
    match snapshot.stage {
        Stage::Greeting => {
            for (i, url) in snapshot.photos.iter().enumerate() {
                println!("  photo {}: {}", i + 1, url);
            }
            match snapshot.error {
                Some(error) => println!("! {}", error.user_message()),
                None if snapshot.camera_ready => println!("Ready! Press Enter to take photos."),
                None => println!("Starting camera..."),
            }
        }
        Stage::Capturing => match snapshot.countdown {
            Some(value) => println!(
                "Photo {}/{}  ... {}",
                snapshot.capture_index, snapshot.photo_count, value
            ),
            None if snapshot.photos.len() as u32 == snapshot.capture_index => {
                if let Some(url) = snapshot.photos.last() {
                    println!("  saved: {}", url);
                }
            }
            None => println!("Photo {}/{}  *click*", snapshot.capture_index, snapshot.photo_count),
        },
        Stage::Review => {
            println!("Your photos:");
            for (i, url) in snapshot.photos.iter().enumerate() {
                println!("  {}. {}", i + 1, url);
            }
            if let Some(gallery) = &snapshot.gallery_url {
                println!("Gallery: {}", gallery);
            }
            println!("Press [Enter] or [r] to start over.");
        }
    }
}

/// Run the interactive terminal kiosk
pub fn run_kiosk(config: Config) -> CliResult {
    let quit = CancellationToken::new();
    install_ctrlc(quit.clone())?;

    let rt = runtime()?;
    rt.block_on(async {
        let booth = build_booth(&config);
        let mut snapshots = booth.subscribe();

        println!("Photo booth ({} photos per run)", config.photo_count);
        print_help();
        if let Err(e) = booth.enter_greeting().await {
            warn!(error = %e, "Greeting failed");
        }
        render(&snapshots.borrow_and_update().clone());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = quit.cancelled() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    render(&snapshot);
                }
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "Failed to read input");
                            break;
                        }
                    };
                    match KioskCommand::parse(&line) {
                        // Enter on the review screen starts over
                        KioskCommand::TakePhotos
                            if booth.stage().current_stage() == Stage::Review =>
                        {
                            let booth = Arc::clone(&booth);
                            tokio::spawn(async move {
                                if let Err(e) = booth.retake().await {
                                    println!("{}", e.user_message());
                                }
                            });
                        }
                        KioskCommand::TakePhotos => {
                            let booth = Arc::clone(&booth);
                            tokio::spawn(async move {
                                if let Err(BoothError::Busy) = booth.take_photos().await {
                                    println!("{}", BoothError::Busy.user_message());
                                }
                            });
                        }
                        KioskCommand::Retake => {
                            let booth = Arc::clone(&booth);
                            tokio::spawn(async move {
                                if let Err(e) = booth.retake().await {
                                    println!("{}", e.user_message());
                                }
                            });
                        }
                        KioskCommand::Cancel => booth.cancel(),
                        KioskCommand::Quit => break,
                        KioskCommand::Help => print_help(),
                    }
                }
            }
        }

        booth.shutdown().await;
    });

    // stdin reads sit on the blocking pool and never return on their own
    rt.shutdown_timeout(Duration::from_secs(timing::STOP_TIMEOUT_SECS));
    println!("Goodbye.");
    Ok(())
}

/// Take one set of photos and print the links
pub fn snap(config: Config) -> CliResult {
    let rt = runtime()?;
    let result = rt.block_on(async {
        let booth = build_booth(&config);
        let interrupt = CancellationToken::new();
        install_ctrlc(interrupt.clone())?;
        {
            let booth = Arc::clone(&booth);
            let interrupt = interrupt.clone();
            tokio::spawn(async move {
                interrupt.cancelled().await;
                booth.cancel();
            });
        }

        let mut snapshots = booth.subscribe();
        let progress = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                if let (Stage::Capturing, Some(value)) = (snapshot.stage, snapshot.countdown) {
                    println!(
                        "Photo {}/{}  ... {}",
                        snapshot.capture_index, snapshot.photo_count, value
                    );
                }
            }
        });

        let outcome = match booth.enter_greeting().await {
            Ok(()) => booth.take_photos().await,
            Err(e) => Err(e),
        };
        booth.shutdown().await;
        progress.abort();

        match outcome {
            Ok(snapshot) => {
                for (i, url) in snapshot.photos.iter().enumerate() {
                    println!("{}. {}", i + 1, url);
                }
                if let Some(gallery) = snapshot.gallery_url {
                    println!("Gallery: {}", gallery);
                }
                CliResult::Ok(())
            }
            Err(e) => {
                eprintln!("{}", e.user_message());
                Err(Box::new(AppError::from(e)) as Box<dyn std::error::Error>)
            }
        }
    });
    rt.shutdown_timeout(Duration::from_secs(timing::STOP_TIMEOUT_SECS));
    result
}

/// Capture a single still to disk
pub fn probe(config: Config, output: Option<PathBuf>) -> CliResult {
    let rt = runtime()?;
    rt.block_on(async {
        let mut camera = CameraManager::new(&config);
        println!("Using camera source: {}", camera.source());

        let state = camera.acquire().await;
        if let Some(kind) = state.last_error {
            return Err(format!("{} ({})", kind.user_message(), kind).into());
        }

        // Wait for frames to stabilize (camera warm-up)
        tokio::time::sleep(Duration::from_millis(timing::PROBE_WARMUP_MS)).await;
        let start = Instant::now();
        let timeout = Duration::from_secs(timing::PROBE_TIMEOUT_SECS);
        let image = loop {
            if let Some(image) = camera.capture_frame().await? {
                break image;
            }
            if start.elapsed() > timeout {
                camera.release();
                return Err("Failed to capture frame from camera".into());
            }
            tokio::time::sleep(Duration::from_millis(16)).await;
        };
        camera.release();

        println!("Capture size: {}x{}", image.width, image.height);
        let path = match output {
            Some(path) if path.is_dir() => PhotoEncoder::save(&image, &path).await?,
            Some(path) => {
                PhotoEncoder::save_as(&image, &path).await?;
                path
            }
            None => PhotoEncoder::save(&image, &std::env::current_dir()?).await?,
        };
        println!("Photo saved: {}", path.display());
        CliResult::Ok(())
    })
}
