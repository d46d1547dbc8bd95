//! Feishu (Lark) channel adapter (stub).
//!
//! In production this would hold a long-lived event subscription opened with
//! the app credentials. Credentials and the allow-list can be swapped in place.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::{
    Channel, ChannelSettings, InboundMessage, OutboundMessage, Reconfigure,
};
use relayclaw_core::error::ChannelError;
use tracing::info;

use crate::base::AdapterState;

#[derive(Clone)]
pub struct FeishuConfig {
    pub app_id: String,
    pub app_secret: String,
    pub encrypt_key: Option<String>,
    pub verification_token: Option<String>,
}

impl FeishuConfig {
    pub fn from_settings(settings: &ChannelSettings) -> Result<Self, ChannelError> {
        Ok(Self {
            app_id: settings.require_str("feishu", "app_id")?.to_string(),
            app_secret: settings.require_str("feishu", "app_secret")?.to_string(),
            encrypt_key: settings.get_str("encrypt_key").map(str::to_string),
            verification_token: settings.get_str("verification_token").map(str::to_string),
        })
    }
}

impl std::fmt::Debug for FeishuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("encrypt_key", &self.encrypt_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "verification_token",
                &self.verification_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

pub struct FeishuChannel {
    state: AdapterState,
    config: RwLock<FeishuConfig>,
}

impl FeishuChannel {
    pub fn new(settings: &ChannelSettings, bus: Arc<MessageBus>) -> Result<Self, ChannelError> {
        let config = FeishuConfig::from_settings(settings)?;
        Ok(Self {
            state: AdapterState::new("feishu", settings, bus),
            config: RwLock::new(config),
        })
    }

    pub fn config(&self) -> FeishuConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Handle an `im.message.receive_v1` event.
    pub async fn receive(
        &self,
        open_id: &str,
        chat_id: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        let mut msg = InboundMessage::new("feishu", open_id, chat_id, text);
        msg.metadata
            .insert("msg_type".into(), serde_json::Value::String("text".into()));
        self.state.handle_inbound(msg).await
    }
}

#[async_trait]
impl Channel for FeishuChannel {
    fn name(&self) -> &str {
        self.state.name()
    }

    async fn start(&self) -> Result<(), ChannelError> {
        info!(app_id = %self.config().app_id, "Feishu channel starting (stub mode)");
        self.state.run_until_stopped().await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Feishu channel stopping");
        self.state.shutdown();
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        self.state.ensure_running()?;
        let receive_id_type = if msg.chat_id.starts_with("oc_") {
            "chat_id"
        } else {
            "open_id"
        };
        info!(
            receive_id = %msg.chat_id,
            receive_id_type,
            content_len = msg.content.len(),
            "Feishu send (stub)"
        );
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn reconfigure(&self, settings: &ChannelSettings) -> Reconfigure<'_> {
        let result = FeishuConfig::from_settings(settings).map(|config| {
            *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
            self.state.set_allow_from(settings.allow_from.clone());
        });
        Reconfigure::Applied(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(app_id: &str) -> ChannelSettings {
        let mut s = ChannelSettings::default();
        s.extra.insert("app_id".into(), serde_json::json!(app_id));
        s.extra.insert("app_secret".into(), serde_json::json!("shh"));
        s
    }

    #[test]
    fn both_credentials_required() {
        let mut s = settings("cli_a");
        s.extra.remove("app_secret");
        assert!(FeishuChannel::new(&s, Arc::new(MessageBus::default())).is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let config = FeishuConfig::from_settings(&settings("cli_a")).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("cli_a"));
        assert!(!debug.contains("shh"));
    }

    #[test]
    fn reconfigure_swaps_credentials() {
        let ch = FeishuChannel::new(&settings("cli_a"), Arc::new(MessageBus::default())).unwrap();
        assert!(matches!(ch.reconfigure(&settings("cli_b")), Reconfigure::Applied(Ok(()))));
        assert_eq!(ch.config().app_id, "cli_b");
    }

    #[tokio::test]
    async fn receive_tags_message_type() {
        let bus = Arc::new(MessageBus::default());
        let ch = FeishuChannel::new(&settings("cli_a"), bus.clone()).unwrap();
        ch.receive("ou_1", "oc_1", "你好").await.unwrap();
        let msg = bus.consume_inbound().await.unwrap();
        assert_eq!(msg.metadata["msg_type"], "text");
    }
}
