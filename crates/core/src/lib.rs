//! # RelayClaw Core
//!
//! Domain types, traits, and error definitions shared by every RelayClaw
//! crate. Nothing in here talks to the network: channel adapters and model
//! backends are traits that the outer crates implement.
//!
//! ## Layout
//!
//! - [`channel`]: the adapter contract and outbound/inbound message types
//! - [`bus`]: the queue pair connecting adapters to the rest of the system
//! - [`message`]: conversation history entries handed to a provider
//! - [`provider`]: completion request/response and the `Provider` trait
//! - [`error`]: per-context error enums

pub mod bus;
pub mod channel;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use bus::MessageBus;
pub use channel::{Channel, ChannelKind, InboundMessage, OutboundMessage, Reconfigure};
pub use error::{ChannelError, Error, ProviderError, Result};
pub use message::{ContentPart, Message, MessageContent, MessageToolCall, Role};
pub use provider::{
    CompletionRequest, CompletionResponse, FinishReason, Provider, ToolCallRequest,
    ToolDefinition, Usage,
};
