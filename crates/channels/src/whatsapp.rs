//! WhatsApp channel adapter (stub).
//!
//! WhatsApp is reached through a local bridge process speaking WebSocket.
//! The bridge connection is fixed at start, so settings changes only take
//! effect after the channel is disabled and re-enabled.

use std::sync::Arc;

use async_trait::async_trait;
use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::{Channel, ChannelSettings, InboundMessage, OutboundMessage};
use relayclaw_core::error::ChannelError;
use tracing::info;

use crate::base::AdapterState;

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// e.g. `ws://localhost:3001`
    pub bridge_url: String,
}

impl WhatsAppConfig {
    pub fn from_settings(settings: &ChannelSettings) -> Result<Self, ChannelError> {
        Ok(Self {
            bridge_url: settings.require_str("whatsapp", "bridge_url")?.to_string(),
        })
    }
}

pub struct WhatsAppChannel {
    state: AdapterState,
    config: WhatsAppConfig,
}

impl WhatsAppChannel {
    pub fn new(settings: &ChannelSettings, bus: Arc<MessageBus>) -> Result<Self, ChannelError> {
        Ok(Self {
            config: WhatsAppConfig::from_settings(settings)?,
            state: AdapterState::new("whatsapp", settings, bus),
        })
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    /// Handle a bridge `message` frame. The sender is the JID's user part.
    pub async fn receive(&self, jid: &str, content: &str) -> Result<(), ChannelError> {
        let sender = jid.split('@').next().unwrap_or(jid);
        self.state
            .handle_inbound(InboundMessage::new("whatsapp", sender, jid, content))
            .await
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        self.state.name()
    }

    async fn start(&self) -> Result<(), ChannelError> {
        info!(bridge = %self.config.bridge_url, "WhatsApp channel starting (stub mode)");
        // In production: connect to the bridge and reconnect on drop
        self.state.run_until_stopped().await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("WhatsApp channel stopping");
        self.state.shutdown();
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        self.state.ensure_running()?;
        info!(to = %msg.chat_id, content_len = msg.content.len(), "WhatsApp send (stub)");
        // In production: write {"type": "send", "to": ..., "text": ...} to the bridge
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.is_running()
    }
}
