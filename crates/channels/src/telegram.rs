//! Telegram channel adapter (stub).
//!
//! Implements the Channel trait for the Telegram Bot API.
//! In production, this would use `teloxide` for long polling.
//! Currently the adapter tracks its lifecycle and logs deliveries; platform
//! updates are fed in through [`TelegramChannel::receive`].

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::{
    Channel, ChannelSettings, InboundMessage, OutboundMessage, Reconfigure,
};
use relayclaw_core::error::ChannelError;
use tracing::info;

use crate::base::AdapterState;

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: String,
    /// HTTP or SOCKS proxy for the Bot API.
    pub proxy: Option<String>,
}

impl TelegramConfig {
    pub fn from_settings(settings: &ChannelSettings) -> Result<Self, ChannelError> {
        Ok(Self {
            token: settings.require_str("telegram", "token")?.to_string(),
            proxy: settings.get_str("proxy").map(str::to_string),
        })
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Telegram channel adapter.
pub struct TelegramChannel {
    state: AdapterState,
    config: RwLock<TelegramConfig>,
}

impl TelegramChannel {
    pub fn new(settings: &ChannelSettings, bus: Arc<MessageBus>) -> Result<Self, ChannelError> {
        let config = TelegramConfig::from_settings(settings)?;
        Ok(Self {
            state: AdapterState::new("telegram", settings, bus),
            config: RwLock::new(config),
        })
    }

    pub fn config(&self) -> TelegramConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Handle an update as if it came from Telegram.
    pub async fn receive(
        &self,
        sender_id: &str,
        chat_id: &str,
        content: &str,
    ) -> Result<(), ChannelError> {
        self.state
            .handle_inbound(InboundMessage::new("telegram", sender_id, chat_id, content))
            .await
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        self.state.name()
    }

    async fn start(&self) -> Result<(), ChannelError> {
        info!(proxy = ?self.config().proxy, "Telegram channel starting (stub mode)");
        // In production: spawn teloxide long-polling loop here
        self.state.run_until_stopped().await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Telegram channel stopping");
        self.state.shutdown();
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        self.state.ensure_running()?;
        info!(
            chat_id = %msg.chat_id,
            reply_to = ?msg.reply_to,
            content_len = msg.content.len(),
            media = msg.media.len(),
            "Telegram send (stub)"
        );
        // In production: call Bot::send_message via teloxide
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn reconfigure(&self, settings: &ChannelSettings) -> Reconfigure<'_> {
        let result = TelegramConfig::from_settings(settings).map(|config| {
            *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
            self.state.set_allow_from(settings.allow_from.clone());
            info!("Telegram settings applied");
        });
        Reconfigure::Applied(result)
    }
}
