//! Channel trait: the abstraction over chat platforms.
//!
//! A Channel connects RelayClaw to a messaging platform (Telegram, Discord,
//! WhatsApp, Feishu). It publishes what users say onto the
//! [`MessageBus`](crate::bus::MessageBus) and delivers outbound replies handed
//! to it by the channel manager.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// The chat surfaces RelayClaw knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Telegram,
    WhatsApp,
    Discord,
    Feishu,
}

impl ChannelKind {
    /// Every supported kind, in the order channels are initialized.
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::Telegram,
        ChannelKind::WhatsApp,
        ChannelKind::Discord,
        ChannelKind::Feishu,
    ];

    /// Registry key used for routing outbound messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::WhatsApp => "whatsapp",
            ChannelKind::Discord => "discord",
            ChannelKind::Feishu => "feishu",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ChannelError::NotConfigured(format!("unknown channel kind '{s}'")))
    }
}

/// Kind-specific adapter settings.
///
/// `allow_from` is common to every platform; everything else (tokens, bridge
/// URLs, app ids) lives in `extra` and is interpreted by the adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Allowed sender IDs. Empty = allow everyone.
    #[serde(default)]
    pub allow_from: Vec<String>,

    /// Platform-specific keys
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ChannelSettings {
    /// A string setting, if present and non-empty.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// A required string setting.
    pub fn require_str(&self, channel: &str, key: &str) -> Result<&str, ChannelError> {
        self.get_str(key)
            .ok_or_else(|| ChannelError::NotConfigured(format!("{channel}: missing '{key}'")))
    }
}

/// A reply the agent wants delivered to a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Registry name of the target channel (e.g. "telegram")
    pub channel: String,

    /// The chat/group/DM identifier within the channel
    pub chat_id: String,

    /// The text content
    pub content: String,

    /// Platform message ID this replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    /// Media URLs or file paths to attach
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,

    /// Platform-specific metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl OutboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            reply_to: None,
            media: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// A message received from a chat platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Registry name of the channel that received it
    pub channel: String,

    /// Sender identifier (platform-specific user ID)
    pub sender_id: String,

    /// The chat/group/DM identifier within the channel
    pub chat_id: String,

    /// The text content
    pub content: String,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            media: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Key identifying the conversation this message belongs to.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

/// How an adapter handles new settings during a hot reload.
pub enum Reconfigure<'a> {
    /// The adapter keeps its current settings.
    Unsupported,
    /// The settings were applied synchronously.
    Applied(Result<(), ChannelError>),
    /// The settings are applied once the future completes.
    Pending(BoxFuture<'a, Result<(), ChannelError>>),
}

impl std::fmt::Debug for Reconfigure<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reconfigure::Unsupported => f.write_str("Unsupported"),
            Reconfigure::Applied(result) => f.debug_tuple("Applied").field(result).finish(),
            Reconfigure::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// The core Channel trait.
///
/// Adapters are shared behind `Arc` between the manager, the dispatch loop and
/// their own start task, so every method takes `&self`; implementations keep
/// their mutable state behind atomics or locks.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Registry name (e.g., "telegram", "discord").
    fn name(&self) -> &str;

    /// Connect and run until [`stop`](Channel::stop) is called.
    async fn start(&self) -> Result<(), ChannelError>;

    /// Disconnect and release resources. Calling it twice is harmless.
    async fn stop(&self) -> Result<(), ChannelError>;

    /// Deliver one outbound message.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;

    /// Whether the adapter is currently connected.
    fn is_running(&self) -> bool;

    /// Apply new settings without a restart.
    fn reconfigure(&self, _settings: &ChannelSettings) -> Reconfigure<'_> {
        Reconfigure::Unsupported
    }
}
