//! Chat channel implementations for RelayClaw.
//!
//! Each channel connects to a chat platform, publishes what users say onto the
//! message bus and delivers replies routed to it by the [`ChannelManager`].
//!
//! Available channels (each behind a cargo feature of the same name):
//! - **Telegram**: Telegram Bot API (stub, needs teloxide in production)
//! - **WhatsApp**: local WebSocket bridge (stub)
//! - **Discord**: Discord gateway (stub, needs serenity in production)
//! - **Feishu**: Feishu/Lark event subscription (stub)

mod base;
pub mod catalog;
#[cfg(feature = "discord")]
pub mod discord;
#[cfg(feature = "feishu")]
pub mod feishu;
pub mod manager;
#[cfg(feature = "telegram")]
pub mod telegram;
#[cfg(feature = "whatsapp")]
pub mod whatsapp;

pub use catalog::ChannelCatalog;
#[cfg(feature = "discord")]
pub use discord::{DiscordChannel, DiscordConfig};
#[cfg(feature = "feishu")]
pub use feishu::{FeishuChannel, FeishuConfig};
pub use manager::{ChannelManager, ChannelStatus};
#[cfg(feature = "telegram")]
pub use telegram::{TelegramChannel, TelegramConfig};
#[cfg(feature = "whatsapp")]
pub use whatsapp::{WhatsAppChannel, WhatsAppConfig};
