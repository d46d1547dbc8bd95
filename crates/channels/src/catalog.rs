//! Capability catalog: which channel kinds this build can construct.
//!
//! Each [`ChannelKind`] maps to a constructor and an availability probe. The
//! built-in catalog registers one entry per enabled cargo feature, so a build
//! without e.g. `feishu` simply reports that kind as unavailable.

use std::collections::HashMap;
use std::sync::Arc;

use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::{Channel, ChannelKind, ChannelSettings};
use relayclaw_core::error::ChannelError;

/// Builds one adapter from its settings.
pub type Constructor = Arc<
    dyn Fn(&ChannelSettings, Arc<MessageBus>) -> Result<Arc<dyn Channel>, ChannelError>
        + Send
        + Sync,
>;

struct Entry {
    probe: fn() -> bool,
    construct: Constructor,
}

#[derive(Default)]
pub struct ChannelCatalog {
    entries: HashMap<ChannelKind, Entry>,
}

impl ChannelCatalog {
    /// A catalog with no kinds registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every adapter compiled into this build.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut catalog = Self::empty();

        #[cfg(feature = "telegram")]
        catalog.register(ChannelKind::Telegram, |settings, bus| {
            crate::telegram::TelegramChannel::new(settings, bus)
                .map(|c| Arc::new(c) as Arc<dyn Channel>)
        });

        #[cfg(feature = "whatsapp")]
        catalog.register(ChannelKind::WhatsApp, |settings, bus| {
            crate::whatsapp::WhatsAppChannel::new(settings, bus)
                .map(|c| Arc::new(c) as Arc<dyn Channel>)
        });

        #[cfg(feature = "discord")]
        catalog.register(ChannelKind::Discord, |settings, bus| {
            crate::discord::DiscordChannel::new(settings, bus)
                .map(|c| Arc::new(c) as Arc<dyn Channel>)
        });

        #[cfg(feature = "feishu")]
        catalog.register(ChannelKind::Feishu, |settings, bus| {
            crate::feishu::FeishuChannel::new(settings, bus)
                .map(|c| Arc::new(c) as Arc<dyn Channel>)
        });

        catalog
    }

    /// Register a constructor that is always available.
    pub fn register<F>(&mut self, kind: ChannelKind, construct: F)
    where
        F: Fn(&ChannelSettings, Arc<MessageBus>) -> Result<Arc<dyn Channel>, ChannelError>
            + Send
            + Sync
            + 'static,
    {
        self.register_with_probe(kind, || true, construct);
    }

    /// Register a constructor guarded by a runtime availability probe.
    pub fn register_with_probe<F>(&mut self, kind: ChannelKind, probe: fn() -> bool, construct: F)
    where
        F: Fn(&ChannelSettings, Arc<MessageBus>) -> Result<Arc<dyn Channel>, ChannelError>
            + Send
            + Sync
            + 'static,
    {
        self.entries.insert(
            kind,
            Entry {
                probe,
                construct: Arc::new(construct),
            },
        );
    }

    pub fn is_available(&self, kind: ChannelKind) -> bool {
        self.entries.get(&kind).is_some_and(|entry| (entry.probe)())
    }

    /// Kinds this catalog can construct, in initialization order.
    pub fn available_kinds(&self) -> Vec<ChannelKind> {
        ChannelKind::ALL
            .into_iter()
            .filter(|kind| self.is_available(*kind))
            .collect()
    }

    pub fn construct(
        &self,
        kind: ChannelKind,
        settings: &ChannelSettings,
        bus: Arc<MessageBus>,
    ) -> Result<Arc<dyn Channel>, ChannelError> {
        match self.entries.get(&kind) {
            Some(entry) if (entry.probe)() => (entry.construct)(settings, bus),
            _ => Err(ChannelError::Unavailable(kind.to_string())),
        }
    }
}

impl std::fmt::Debug for ChannelCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelCatalog")
            .field("available", &self.available_kinds())
            .finish()
    }
}
