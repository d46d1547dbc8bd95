//! State every adapter carries: running flag, shutdown token, allow-list and
//! the bus handle inbound messages are published to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::{ChannelSettings, InboundMessage};
use relayclaw_core::error::ChannelError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct AdapterState {
    name: &'static str,
    running: AtomicBool,
    /// Cancelled once; a stopped adapter never runs again.
    shutdown: CancellationToken,
    allow_from: RwLock<Vec<String>>,
    bus: Arc<MessageBus>,
}

impl AdapterState {
    pub fn new(name: &'static str, settings: &ChannelSettings, bus: Arc<MessageBus>) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            allow_from: RwLock::new(settings.allow_from.clone()),
            bus,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Mark the adapter running and park until [`shutdown`](Self::shutdown).
    ///
    /// Returns at once if the adapter was already shut down, including a stop
    /// that landed before the start task was first polled.
    pub async fn run_until_stopped(&self) {
        if self.shutdown.is_cancelled() {
            debug!(channel = self.name, "Channel stopped before it started");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        info!(channel = self.name, "Channel running");
        self.shutdown.cancelled().await;
        self.running.store(false, Ordering::SeqCst);
        info!(channel = self.name, "Channel stopped");
    }

    /// Release a pending [`run_until_stopped`](Self::run_until_stopped) and
    /// keep any later one from parking. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn ensure_running(&self) -> Result<(), ChannelError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(ChannelError::NotRunning(self.name.to_string()))
        }
    }

    pub fn set_allow_from(&self, allow_from: Vec<String>) {
        *self.allow_from.write().unwrap_or_else(|e| e.into_inner()) = allow_from;
    }

    /// Empty allow-list admits everyone. Compound ids (`id|username`) match
    /// on any non-empty segment.
    pub fn is_allowed(&self, sender_id: &str) -> bool {
        let allow_from = self.allow_from.read().unwrap_or_else(|e| e.into_inner());
        if allow_from.is_empty() {
            return true;
        }
        if allow_from.iter().any(|a| a == sender_id) {
            return true;
        }
        sender_id.contains('|')
            && sender_id
                .split('|')
                .any(|part| !part.is_empty() && allow_from.iter().any(|a| a == part))
    }

    /// Check the sender against the allow-list and publish onto the bus.
    pub async fn handle_inbound(&self, msg: InboundMessage) -> Result<(), ChannelError> {
        if !self.is_allowed(&msg.sender_id) {
            warn!(
                channel = self.name,
                sender_id = %msg.sender_id,
                "Access denied; add the sender to allow_from to grant access"
            );
            return Err(ChannelError::Unauthorized {
                channel: self.name.to_string(),
                sender_id: msg.sender_id,
            });
        }

        debug!(channel = self.name, chat_id = %msg.chat_id, "Inbound message");
        self.bus.publish_inbound(msg).await;
        Ok(())
    }
}
