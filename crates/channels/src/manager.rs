//! Channel manager: owns every active adapter.
//!
//! Builds adapters from the configuration snapshot, starts and stops them,
//! routes outbound messages from the bus to the matching adapter and applies
//! configuration changes while running.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::FutureExt;
use relayclaw_config::{AppConfig, ChannelConfig};
use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::{Channel, ChannelKind, Reconfigure};
use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::ChannelCatalog;

/// Upper bound on one wait for an outbound message; cancellation is observed
/// at least this often.
pub const DISPATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

type Registry = Arc<RwLock<HashMap<String, Arc<dyn Channel>>>>;

/// Status of one registered channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub enabled: bool,
    pub running: bool,
}

struct Dispatcher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ChannelManager {
    bus: Arc<MessageBus>,
    catalog: ChannelCatalog,
    config: RwLock<Arc<AppConfig>>,
    channels: Registry,
    dispatcher: Mutex<Option<Dispatcher>>,
    /// Serializes reloads and shutdown.
    control: tokio::sync::Mutex<()>,
}

impl ChannelManager {
    /// Build the registry from `config` using every adapter compiled in.
    pub fn new(config: Arc<AppConfig>, bus: Arc<MessageBus>) -> Self {
        Self::with_catalog(config, bus, ChannelCatalog::builtin())
    }

    pub fn with_catalog(
        config: Arc<AppConfig>,
        bus: Arc<MessageBus>,
        catalog: ChannelCatalog,
    ) -> Self {
        let manager = Self {
            bus,
            catalog,
            config: RwLock::new(config.clone()),
            channels: Arc::new(RwLock::new(HashMap::new())),
            dispatcher: Mutex::new(None),
            control: tokio::sync::Mutex::new(()),
        };

        for kind in config.channels.enabled_kinds() {
            if let Some(channel) = manager.try_construct(kind, config.channels.get(kind)) {
                manager.register(kind, channel);
            }
        }

        manager
    }

    /// Construct one adapter. Unavailable kinds and construction failures are
    /// logged and yield `None`.
    fn try_construct(&self, kind: ChannelKind, config: &ChannelConfig) -> Option<Arc<dyn Channel>> {
        if !self.catalog.is_available(kind) {
            warn!(channel = %kind, "Channel enabled but not available in this build");
            return None;
        }

        match self.catalog.construct(kind, &config.settings, self.bus.clone()) {
            Ok(channel) => Some(channel),
            Err(e) => {
                warn!(channel = %kind, error = %e, "Could not create channel");
                None
            }
        }
    }

    fn register(&self, kind: ChannelKind, channel: Arc<dyn Channel>) {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind.as_str().to_string(), channel);
        info!(channel = %kind, "Channel enabled");
    }

    /// Registered adapters, sorted by name.
    fn snapshot(&self) -> Vec<(String, Arc<dyn Channel>)> {
        let mut channels: Vec<(String, Arc<dyn Channel>)> = self
            .channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, ch)| (name.clone(), ch.clone()))
            .collect();
        channels.sort_by(|a, b| a.0.cmp(&b.0));
        channels
    }

    /// Start the dispatch loop and every adapter.
    ///
    /// Resolves once every adapter's `start` has returned, i.e. after
    /// [`stop_all`](Self::stop_all). One adapter failing or panicking does not
    /// affect the others.
    pub async fn start_all(&self) {
        let channels = self.snapshot();
        if channels.is_empty() {
            warn!("No channels enabled");
            return;
        }

        self.spawn_dispatcher();

        let mut tasks = JoinSet::new();
        for (name, channel) in channels {
            info!(channel = %name, "Starting channel");
            tasks.spawn(run_channel(name, channel));
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Channel task failed");
            }
        }
    }

    fn spawn_dispatcher(&self) {
        let mut slot = self.dispatcher.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|d| !d.handle.is_finished()) {
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(dispatch_outbound(
            self.bus.clone(),
            self.channels.clone(),
            cancel.clone(),
        ));
        *slot = Some(Dispatcher { cancel, handle });
    }

    /// Stop the dispatch loop, then every adapter in turn.
    pub async fn stop_all(&self) {
        let _control = self.control.lock().await;
        info!("Stopping all channels");

        let dispatcher = self
            .dispatcher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(dispatcher) = dispatcher {
            dispatcher.cancel.cancel();
            if let Err(e) = dispatcher.handle.await {
                error!(error = %e, "Outbound dispatcher failed");
            }
        }

        for (name, channel) in self.snapshot() {
            match channel.stop().await {
                Ok(()) => info!(channel = %name, "Stopped channel"),
                Err(e) => error!(channel = %name, error = %e, "Error stopping channel"),
            }
        }
    }

    /// Apply a new configuration snapshot while running.
    ///
    /// Newly enabled kinds are created and started in the background,
    /// disabled ones are stopped and removed, and kinds that stay enabled are
    /// offered the new settings. Enabling a kind also starts the dispatch loop
    /// if none is running.
    pub async fn update_config(&self, config: Arc<AppConfig>) {
        let _control = self.control.lock().await;
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config.clone();

        for kind in ChannelKind::ALL {
            let wanted = config.channels.get(kind);
            let current = self.get_channel(kind.as_str());

            match (wanted.enabled, current) {
                (true, None) => {
                    if let Some(channel) = self.try_construct(kind, wanted) {
                        self.register(kind, channel.clone());
                        self.spawn_dispatcher();
                        tokio::spawn(run_channel(kind.as_str().to_string(), channel));
                    }
                }
                (false, Some(channel)) => {
                    if let Err(e) = channel.stop().await {
                        error!(channel = %kind, error = %e, "Error stopping channel");
                    }
                    self.channels
                        .write()
                        .unwrap_or_else(|e| e.into_inner())
                        .remove(kind.as_str());
                    info!(channel = %kind, "Channel disabled");
                }
                (true, Some(channel)) => {
                    let result = match channel.reconfigure(&wanted.settings) {
                        Reconfigure::Unsupported => {
                            debug!(channel = %kind, "Channel keeps its settings until restarted");
                            continue;
                        }
                        Reconfigure::Applied(result) => result,
                        Reconfigure::Pending(fut) => fut.await,
                    };
                    match result {
                        Ok(()) => info!(channel = %kind, "Channel reconfigured"),
                        Err(e) => error!(channel = %kind, error = %e, "Channel reconfigure failed"),
                    }
                }
                (false, None) => {}
            }
        }

        info!("Channel manager configuration updated via hot reload");
    }

    pub fn get_channel(&self, name: &str) -> Option<Arc<dyn Channel>> {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Every registered channel with its running state.
    pub fn status(&self) -> BTreeMap<String, ChannelStatus> {
        self.snapshot()
            .into_iter()
            .map(|(name, ch)| {
                let status = ChannelStatus {
                    enabled: true,
                    running: ch.is_running(),
                };
                (name, status)
            })
            .collect()
    }

    /// Names of registered channels, sorted.
    pub fn enabled_channels(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|(name, _)| name).collect()
    }

    /// The configuration snapshot currently applied.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }
}

impl Drop for ChannelManager {
    fn drop(&mut self) {
        let dispatcher = self
            .dispatcher
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(dispatcher) = dispatcher {
            dispatcher.cancel.cancel();
        }
    }
}

/// Run one adapter to completion, logging how it ended.
async fn run_channel(name: String, channel: Arc<dyn Channel>) {
    match AssertUnwindSafe(channel.start()).catch_unwind().await {
        Ok(Ok(())) => debug!(channel = %name, "Channel exited"),
        Ok(Err(e)) => error!(channel = %name, error = %e, "Failed to start channel"),
        Err(_) => error!(channel = %name, "Channel task panicked"),
    }
}

/// Drain the outbound queue until cancelled. Delivery is at-most-once.
async fn dispatch_outbound(bus: Arc<MessageBus>, channels: Registry, cancel: CancellationToken) {
    info!("Outbound dispatcher started");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = tokio::time::timeout(DISPATCH_POLL_INTERVAL, bus.consume_outbound()) => next,
        };

        let msg = match next {
            Err(_) => continue,
            Ok(None) => {
                warn!("Outbound queue closed");
                break;
            }
            Ok(Some(msg)) => msg,
        };

        let channel = channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&msg.channel)
            .cloned();

        match channel {
            Some(channel) => {
                if let Err(e) = channel.send(&msg).await {
                    error!(channel = %msg.channel, error = %e, "Error sending message");
                }
            }
            None => warn!(channel = %msg.channel, "Unknown channel"),
        }
    }

    info!("Outbound dispatcher stopped");
}
