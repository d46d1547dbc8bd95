//! Discord channel adapter (stub).
//!
//! Implements the Channel trait for the Discord Bot API.
//! In production, this would use `serenity` for the WebSocket gateway.
//! A settings change means re-identifying with the gateway, so
//! reconfiguration completes asynchronously.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::{
    Channel, ChannelSettings, InboundMessage, OutboundMessage, Reconfigure,
};
use relayclaw_core::error::ChannelError;
use tracing::info;

use crate::base::AdapterState;

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// GUILDS | GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
pub const DEFAULT_INTENTS: u64 = 37377;

/// Discord channel configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token from Discord Developer Portal.
    pub token: String,
    pub gateway_url: String,
    pub intents: u64,
}

impl DiscordConfig {
    pub fn from_settings(settings: &ChannelSettings) -> Result<Self, ChannelError> {
        Ok(Self {
            token: settings.require_str("discord", "token")?.to_string(),
            gateway_url: settings
                .get_str("gateway_url")
                .unwrap_or(DEFAULT_GATEWAY_URL)
                .to_string(),
            intents: settings
                .extra
                .get("intents")
                .and_then(|v| v.as_u64())
                .unwrap_or(DEFAULT_INTENTS),
        })
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("gateway_url", &self.gateway_url)
            .field("intents", &self.intents)
            .finish()
    }
}

/// Discord channel adapter.
pub struct DiscordChannel {
    state: AdapterState,
    config: RwLock<DiscordConfig>,
}

impl DiscordChannel {
    pub fn new(settings: &ChannelSettings, bus: Arc<MessageBus>) -> Result<Self, ChannelError> {
        let config = DiscordConfig::from_settings(settings)?;
        Ok(Self {
            state: AdapterState::new("discord", settings, bus),
            config: RwLock::new(config),
        })
    }

    pub fn config(&self) -> DiscordConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Handle a MESSAGE_CREATE event as if it came from the gateway.
    pub async fn receive(
        &self,
        author_id: &str,
        channel_id: &str,
        content: &str,
    ) -> Result<(), ChannelError> {
        self.state
            .handle_inbound(InboundMessage::new("discord", author_id, channel_id, content))
            .await
    }

    async fn reidentify(
        &self,
        config: DiscordConfig,
        allow_from: Vec<String>,
    ) -> Result<(), ChannelError> {
        info!(
            gateway = %config.gateway_url,
            intents = config.intents,
            "Discord re-identifying (stub)"
        );
        // In production: close the shard and send a fresh IDENTIFY
        tokio::task::yield_now().await;
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        self.state.set_allow_from(allow_from);
        Ok(())
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        self.state.name()
    }

    async fn start(&self) -> Result<(), ChannelError> {
        info!(gateway = %self.config().gateway_url, "Discord channel starting (stub mode)");
        // In production: connect to the gateway and run the event loop
        self.state.run_until_stopped().await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Discord channel stopping");
        self.state.shutdown();
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        self.state.ensure_running()?;
        info!(
            channel_id = %msg.chat_id,
            reply_to = ?msg.reply_to,
            content_len = msg.content.len(),
            "Discord send (stub)"
        );
        // In production: POST /channels/{id}/messages
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn reconfigure(&self, settings: &ChannelSettings) -> Reconfigure<'_> {
        match DiscordConfig::from_settings(settings) {
            Ok(config) => {
                let allow_from = settings.allow_from.clone();
                Reconfigure::Pending(Box::pin(self.reidentify(config, allow_from)))
            }
            Err(e) => Reconfigure::Applied(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(token: &str) -> ChannelSettings {
        let mut s = ChannelSettings::default();
        s.extra.insert("token".into(), serde_json::json!(token));
        s
    }

    #[test]
    fn config_defaults() {
        let config = DiscordConfig::from_settings(&settings("tok")).unwrap();
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.intents, DEFAULT_INTENTS);
        assert!(!format!("{config:?}").contains("tok"));
    }

    #[tokio::test]
    async fn reconfigure_is_pending_until_awaited() {
        let ch = DiscordChannel::new(&settings("old"), Arc::new(MessageBus::default())).unwrap();
        match ch.reconfigure(&settings("new")) {
            Reconfigure::Pending(fut) => {
                assert_eq!(ch.config().token, "old");
                fut.await.unwrap();
            }
            other => panic!("expected pending reconfigure, got {other:?}"),
        }
        assert_eq!(ch.config().token, "new");
    }

    #[test]
    fn invalid_settings_rejected_immediately() {
        let ch = DiscordChannel::new(&settings("tok"), Arc::new(MessageBus::default())).unwrap();
        assert!(matches!(
            ch.reconfigure(&ChannelSettings::default()),
            Reconfigure::Applied(Err(ChannelError::NotConfigured(_)))
        ));
    }

    #[tokio::test]
    async fn send_when_stopped_fails() {
        let ch = DiscordChannel::new(&settings("tok"), Arc::new(MessageBus::default())).unwrap();
        let msg = OutboundMessage::new("discord", "c1", "hi");
        assert!(ch.send(&msg).await.is_err());
        // stop without start is harmless
        ch.stop().await.unwrap();
        ch.stop().await.unwrap();
    }

    #[tokio::test]
    async fn receive_respects_allow_list() {
        let bus = Arc::new(MessageBus::default());
        let mut s = settings("tok");
        s.allow_from = vec!["1234".into()];
        let ch = DiscordChannel::new(&s, bus.clone()).unwrap();

        assert!(ch.receive("9999", "c1", "hi").await.is_err());
        ch.receive("1234", "c1", "hi").await.unwrap();
        assert_eq!(bus.inbound_size(), 1);
    }
}
