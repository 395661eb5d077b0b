//! Driftwave headless player - command-line entry point
//!
//! Loads one asset through the `Player` facade, plays it (whole, from a
//! frame, or a frame range) on the headless engine, and logs every facade
//! event as JSON until playback ends or Ctrl+C is pressed.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use driftwave_player::{
    AssetLoader, AutoSource, CallOutcome, DelegatedLoader, EventKind, HeadlessEngine,
    HeadlessEngineFactory, PlaybackState, Player, PlayerConfig, StagedLoader,
};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for driftwave
#[derive(Parser, Debug)]
#[command(name = "driftwave")]
#[command(about = "Headless audio player built on the Driftwave facade")]
#[command(version)]
struct Args {
    /// Audio file path, file:// URL or http(s) URL
    source: String,

    /// First frame to play
    #[arg(long)]
    from: Option<u64>,

    /// Stop before this frame (plays from --from, or frame 0)
    #[arg(long)]
    to: Option<u64>,

    /// Configuration file (overrides DRIFTWAVE_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fetch, decode and adopt as separate stages
    #[arg(long)]
    staged: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) = PlayerConfig::load_with_source(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "driftwave={level},driftwave_player={level},driftwave_common={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Config is read before the subscriber exists; report where it came from now
    info!("Configuration: {}", config_source);
    info!("Starting driftwave ({:?} profile)", config.profile);

    if args.staged {
        run(&args, config, StagedLoader::new(AutoSource::new())).await
    } else {
        run(&args, config, DelegatedLoader).await
    }
}

async fn run<L>(args: &Args, config: PlayerConfig, loader: L) -> Result<()>
where
    L: AssetLoader<HeadlessEngine>,
{
    let factory =
        HeadlessEngineFactory::new().with_progress_interval(config.progress_interval_frames);
    let mut player = Player::create_with_loader(&factory, loader, config)
        .await
        .context("Failed to initialize playback engine")?;

    for kind in EventKind::ALL {
        player.on(kind, |event| match serde_json::to_string(event) {
            Ok(json) => info!("event {}", json),
            Err(e) => warn!("Unserializable event {:?}: {}", event, e),
        });
    }

    player
        .load(&args.source)
        .await
        .with_context(|| format!("Failed to load {}", args.source))?;

    if let Some(metadata) = player.metadata() {
        info!(
            "{}: {} Hz, {} channels, {} frames ({} ms)",
            args.source,
            metadata.sample_rate,
            metadata.channel_count,
            metadata.frame_count,
            metadata.duration_ms()
        );
    }

    let outcome = match (args.from, args.to) {
        (None, None) => player.play(),
        (Some(from), None) => player.play_from(from),
        (from, Some(to)) => player.play_range(from.unwrap_or(0), to),
    };
    match outcome {
        CallOutcome::Applied => {}
        CallOutcome::Ignored(reason) => bail!("Playback not started: {}", reason),
        CallOutcome::Rejected(e) => return Err(e).context("Engine refused playback"),
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Some(frame) = player.pause() {
                    info!("Stopped at frame {}", frame);
                }
                break;
            }
            _ = ticker.tick() => {
                player.poll_engine();
                if player.state() != PlaybackState::Playing {
                    break;
                }
            }
        }
    }

    info!("Playback complete");
    Ok(())
}

/// Resolves on Ctrl+C (or SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping");
        },
    }
}
