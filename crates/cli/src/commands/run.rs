//! `relayclaw run`: start channels and relay until interrupted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use relayclaw_channels::ChannelManager;
use relayclaw_config::AppConfig;
use relayclaw_core::bus::MessageBus;
use tracing::{error, info};

pub async fn run(
    config: AppConfig,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bus = Arc::new(MessageBus::default());
    let manager = Arc::new(ChannelManager::new(Arc::new(config), bus));

    let enabled = manager.enabled_channels();
    if enabled.is_empty() {
        println!(
            "No channels enabled. Enable one under [channels.<name>] and send SIGHUP to reload."
        );
    } else {
        println!("RelayClaw running with channels: {}", enabled.join(", "));
    }

    let runner = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start_all().await })
    };

    wait_for_shutdown(&manager, config_path.as_deref()).await?;

    info!("Shutting down");
    manager.stop_all().await;
    runner.await?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown(
    manager: &ChannelManager,
    config_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => return Ok(result?),
            _ = hangup.recv() => reload(manager, config_path).await,
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(
    _manager: &ChannelManager,
    _config_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

/// Re-read the config and hand it to the manager. A broken file keeps the
/// running configuration.
async fn reload(manager: &ChannelManager, config_path: Option<&Path>) {
    info!("Reloading configuration");
    match super::load_config(config_path) {
        Ok(config) => manager.update_config(Arc::new(config)).await,
        Err(e) => error!(error = %e, "Config reload failed, keeping current configuration"),
    }
}
