use anyhow::{Context, Result};
use share_limits::core::config::Config;
use share_limits::core::startup::{build_engine, build_notifier, connect_client};
use share_limits::core::tracing_init::init_tracing;
use share_limits::share_limits::runner::ShareLimitsEngine;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("config.toml")
    };

    // Load and validate configuration
    let config = Config::from_file(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        If this is your first run, copy config.example.toml to config.toml and adjust the values.",
        config_path.display()
    ))?;

    init_tracing(&config.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        qbittorrent = %config.qbittorrent.url,
        dry_run = config.settings.dry_run,
        groups = config.share_limits.len(),
        interval_minutes = ?config.schedule.interval_minutes,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "Share limits starting"
    );

    let client = connect_client(&config).await?;
    let notifier = build_notifier(&config)?;
    let engine = build_engine(&config, client, notifier);

    match config.schedule.interval_minutes {
        None => run_pass(&engine).await,
        Some(minutes) => {
            let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
            let shutdown = shutdown_signal();
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = run_pass(&engine).await {
                            error!(error = %e, "Share limits pass failed, retrying next interval");
                        }
                    }
                    _ = &mut shutdown => break,
                }
            }

            info!("Shutting down gracefully");
            Ok(())
        }
    }
}

async fn run_pass(engine: &ShareLimitsEngine) -> Result<()> {
    let summary = engine.run().await.context("Share limits pass failed")?;
    info!(
        tagged = summary.tagged,
        deleted = summary.deleted,
        deleted_contents = summary.deleted_contents,
        "Share limits pass finished"
    );
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
