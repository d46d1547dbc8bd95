//! Per-provider credential table.
//!
//! Each backend family reads its key from its own slot (named after the
//! environment variable that family conventionally uses). A provider owns one
//! table: it can be seeded from pre-existing values, then the configured key is
//! propagated into exactly one slot at construction time. Nothing here touches
//! the process environment.

use std::collections::HashMap;

use crate::dialect::{AGGREGATOR_PREFIX, Dialect, HOSTED_PREFIX, VendorFamily};

/// Endpoint used for Moonshot when no override is configured.
pub const MOONSHOT_DEFAULT_BASE: &str = "https://api.moonshot.cn/v1";

/// A named credential slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialSlot {
    OpenRouter,
    HostedVllm,
    DeepSeek,
    Anthropic,
    OpenAi,
    Gemini,
    Zai,
    DashScope,
    Groq,
    Moonshot,
    /// Endpoint, not a secret; seeded alongside the Moonshot key.
    MoonshotBase,
}

impl CredentialSlot {
    pub const ALL: [CredentialSlot; 11] = [
        CredentialSlot::OpenRouter,
        CredentialSlot::HostedVllm,
        CredentialSlot::DeepSeek,
        CredentialSlot::Anthropic,
        CredentialSlot::OpenAi,
        CredentialSlot::Gemini,
        CredentialSlot::Zai,
        CredentialSlot::DashScope,
        CredentialSlot::Groq,
        CredentialSlot::Moonshot,
        CredentialSlot::MoonshotBase,
    ];

    /// Conventional environment variable for this slot.
    pub fn env_name(&self) -> &'static str {
        match self {
            CredentialSlot::OpenRouter => "OPENROUTER_API_KEY",
            CredentialSlot::HostedVllm => "HOSTED_VLLM_API_KEY",
            CredentialSlot::DeepSeek => "DEEPSEEK_API_KEY",
            CredentialSlot::Anthropic => "ANTHROPIC_API_KEY",
            CredentialSlot::OpenAi => "OPENAI_API_KEY",
            CredentialSlot::Gemini => "GEMINI_API_KEY",
            CredentialSlot::Zai => "ZAI_API_KEY",
            CredentialSlot::DashScope => "DASHSCOPE_API_KEY",
            CredentialSlot::Groq => "GROQ_API_KEY",
            CredentialSlot::Moonshot => "MOONSHOT_API_KEY",
            CredentialSlot::MoonshotBase => "MOONSHOT_API_BASE",
        }
    }

    /// Slot holding the key for an already-resolved model id.
    pub fn for_model(resolved_model: &str) -> Option<Self> {
        let lower = resolved_model.to_lowercase();
        if lower.starts_with(AGGREGATOR_PREFIX) {
            Some(CredentialSlot::OpenRouter)
        } else if lower.starts_with(HOSTED_PREFIX) {
            Some(CredentialSlot::HostedVllm)
        } else {
            VendorFamily::from_prefix(&lower).map(|family| family.credential_slot())
        }
    }
}

impl std::fmt::Display for CredentialSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.env_name())
    }
}

/// Credential values keyed by slot.
#[derive(Clone, Default)]
pub struct Credentials {
    values: HashMap<CredentialSlot, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every slot from `lookup(env_name)`. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let values = CredentialSlot::ALL
            .into_iter()
            .filter_map(|slot| {
                lookup(slot.env_name())
                    .filter(|v| !v.is_empty())
                    .map(|v| (slot, v))
            })
            .collect();
        Self { values }
    }

    /// Snapshot the slots that are set in the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn get(&self, slot: CredentialSlot) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }

    /// Overwrite a slot.
    pub fn set(&mut self, slot: CredentialSlot, value: impl Into<String>) {
        self.values.insert(slot, value.into());
    }

    /// Fill a slot only if it is empty. Returns whether the value was stored.
    pub fn set_if_absent(&mut self, slot: CredentialSlot, value: impl Into<String>) -> bool {
        if self.values.contains_key(&slot) {
            return false;
        }
        self.values.insert(slot, value.into());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Store the configured key in the slot its family reads.
    ///
    /// Aggregator and self-hosted keys always overwrite; vendor keys never
    /// replace a value that was already seeded. The vendor family is taken from
    /// keywords in `default_model`. Returns the slot the key was written to, or
    /// `None` when nothing changed.
    pub fn propagate(
        &mut self,
        dialect: Dialect,
        api_key: Option<&str>,
        api_base: Option<&str>,
        default_model: &str,
    ) -> Option<CredentialSlot> {
        let key = api_key?;

        match dialect {
            Dialect::Aggregator => {
                self.set(CredentialSlot::OpenRouter, key);
                Some(CredentialSlot::OpenRouter)
            }
            Dialect::SelfHosted => {
                self.set(CredentialSlot::HostedVllm, key);
                Some(CredentialSlot::HostedVllm)
            }
            Dialect::DirectVendor => {
                let family = VendorFamily::detect(default_model)?;
                let slot = family.credential_slot();
                if family == VendorFamily::Moonshot {
                    self.set_if_absent(
                        CredentialSlot::MoonshotBase,
                        api_base.unwrap_or(MOONSHOT_DEFAULT_BASE),
                    );
                }
                self.set_if_absent(slot, key).then_some(slot)
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&'static str> = self.values.keys().map(|s| s.env_name()).collect();
        names.sort_unstable();
        f.debug_struct("Credentials").field("slots", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregator_key_overwrites() {
        let mut creds = Credentials::new();
        creds.set(CredentialSlot::OpenRouter, "old");
        let slot =
            creds.propagate(Dialect::Aggregator, Some("sk-or-new"), None, "anthropic/claude");
        assert_eq!(slot, Some(CredentialSlot::OpenRouter));
        assert_eq!(creds.get(CredentialSlot::OpenRouter), Some("sk-or-new"));
    }

    #[test]
    fn self_hosted_key_overwrites() {
        let mut creds = Credentials::from_lookup(|name| {
            (name == "HOSTED_VLLM_API_KEY").then(|| "stale".to_string())
        });
        creds.propagate(
            Dialect::SelfHosted,
            Some("fresh"),
            Some("http://localhost:8000/v1"),
            "llama3",
        );
        assert_eq!(creds.get(CredentialSlot::HostedVllm), Some("fresh"));
    }

    #[test]
    fn vendor_key_never_overrides_existing() {
        let mut creds = Credentials::from_lookup(|name| {
            (name == "ANTHROPIC_API_KEY").then(|| "from-env".to_string())
        });
        let slot = creds.propagate(
            Dialect::DirectVendor,
            Some("from-config"),
            None,
            "anthropic/claude-opus-4-5",
        );
        assert_eq!(slot, None);
        assert_eq!(creds.get(CredentialSlot::Anthropic), Some("from-env"));
    }

    #[test]
    fn vendor_key_fills_empty_slot() {
        let mut creds = Credentials::new();
        let slot = creds.propagate(Dialect::DirectVendor, Some("sk-ds"), None, "deepseek-chat");
        assert_eq!(slot, Some(CredentialSlot::DeepSeek));
        assert_eq!(creds.get(CredentialSlot::DeepSeek), Some("sk-ds"));
        // exactly one slot touched
        assert_eq!(CredentialSlot::ALL.iter().filter(|s| creds.get(**s).is_some()).count(), 1);
    }

    #[test]
    fn moonshot_also_seeds_its_endpoint() {
        let mut creds = Credentials::new();
        creds.propagate(Dialect::DirectVendor, Some("sk-moon"), None, "kimi-k2.5");
        assert_eq!(creds.get(CredentialSlot::Moonshot), Some("sk-moon"));
        assert_eq!(creds.get(CredentialSlot::MoonshotBase), Some(MOONSHOT_DEFAULT_BASE));
    }

    #[test]
    fn unknown_family_sets_nothing() {
        let mut creds = Credentials::new();
        assert_eq!(creds.propagate(Dialect::DirectVendor, Some("k"), None, "llama3"), None);
        assert!(creds.is_empty());
    }

    #[test]
    fn no_key_sets_nothing() {
        let mut creds = Credentials::new();
        assert_eq!(creds.propagate(Dialect::Aggregator, None, None, "x"), None);
        assert!(creds.is_empty());
    }

    #[test]
    fn tables_are_independent() {
        let mut a = Credentials::new();
        let b = Credentials::new();
        a.propagate(Dialect::Aggregator, Some("sk-or-a"), None, "x");
        assert!(b.get(CredentialSlot::OpenRouter).is_none());
    }

    #[test]
    fn slot_for_resolved_model() {
        assert_eq!(CredentialSlot::for_model("openrouter/x"), Some(CredentialSlot::OpenRouter));
        assert_eq!(
            CredentialSlot::for_model("hosted_vllm/zai/glm-4"),
            Some(CredentialSlot::HostedVllm)
        );
        assert_eq!(CredentialSlot::for_model("zai/glm-4"), Some(CredentialSlot::Zai));
        assert_eq!(CredentialSlot::for_model("llama3"), None);
    }

    #[test]
    fn debug_hides_values() {
        let mut creds = Credentials::new();
        creds.set(CredentialSlot::Groq, "gsk-secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("GROQ_API_KEY"));
        assert!(!debug.contains("gsk-secret"));
    }
}
