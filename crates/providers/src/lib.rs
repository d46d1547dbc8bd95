//! Completion provider for RelayClaw.
//!
//! [`RoutingProvider`] implements `relayclaw_core::Provider` on top of any
//! [`LlmBackend`]. It resolves the model identifier into the dialect the
//! configured backend family expects, attaches the right credential, and turns
//! every backend failure into an inspectable response.

pub mod backend;
pub mod credentials;
pub mod dialect;
pub mod observe;
pub mod routing;

pub use backend::{BackendCall, BackendReply, BackendToolCall, LlmBackend};
pub use credentials::{CredentialSlot, Credentials};
pub use dialect::{Dialect, VendorFamily};
pub use routing::{ProviderSettings, RoutingProvider};
