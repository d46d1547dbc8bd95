//! Model-identifier dialects.
//!
//! The backend a provider talks to is fixed at construction time: an
//! aggregator (OpenRouter), a self-hosted OpenAI-compatible server (vLLM and
//! friends), or a vendor API reached directly. Each expects model ids in its
//! own shape, e.g. `openrouter/anthropic/claude-opus-4-5`,
//! `hosted_vllm/zai/glm-4.7-flash` or `gemini/gemini-2.0-flash`.
//!
//! Resolution is idempotent: feeding a resolved id back in returns it
//! unchanged.

use crate::credentials::CredentialSlot;

/// Prefix for models routed through the aggregator.
pub const AGGREGATOR_PREFIX: &str = "openrouter/";

/// Prefix for models served by a self-hosted OpenAI-compatible endpoint.
pub const HOSTED_PREFIX: &str = "hosted_vllm/";

/// Credentials issued by the aggregator start with this.
const AGGREGATOR_KEY_PREFIX: &str = "sk-or-";

/// The only temperature `kimi-k2.5` accepts.
const KIMI_K2_5_TEMPERATURE: f32 = 1.0;

/// Backend family the provider was configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// One API key fronting many vendors.
    Aggregator,
    /// An explicit endpoint override that is not the aggregator.
    SelfHosted,
    /// Vendor APIs addressed by their own prefixes.
    DirectVendor,
}

impl Dialect {
    /// Decide the dialect from the credential and endpoint override.
    pub fn detect(api_key: Option<&str>, api_base: Option<&str>) -> Self {
        let aggregator = api_key.is_some_and(|key| key.starts_with(AGGREGATOR_KEY_PREFIX))
            || api_base.is_some_and(|base| base.contains("openrouter"));

        if aggregator {
            Dialect::Aggregator
        } else if api_base.is_some() {
            Dialect::SelfHosted
        } else {
            Dialect::DirectVendor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Aggregator => "openrouter",
            Dialect::SelfHosted => "hosted_vllm",
            Dialect::DirectVendor => "direct",
        }
    }

    /// Rewrite `model` into this dialect's naming.
    pub fn resolve_model(&self, model: &str) -> String {
        let lower = model.to_lowercase();

        if *self == Dialect::Aggregator {
            return if lower.starts_with(AGGREGATOR_PREFIX) {
                model.to_string()
            } else {
                format!("{AGGREGATOR_PREFIX}{model}")
            };
        }

        let mut resolved = model.to_string();
        if !has_recognized_prefix(&lower) {
            if let Some(family) = VendorFamily::detect(&lower) {
                resolved = format!("{}{}", family.prefix(), model);
            }
        }

        // Composes with the vendor prefix instead of replacing it.
        if *self == Dialect::SelfHosted && !resolved.to_lowercase().starts_with(HOSTED_PREFIX) {
            resolved = format!("{HOSTED_PREFIX}{resolved}");
        }

        resolved
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temperature actually sent for `model`. Some models pin it.
pub fn effective_temperature(resolved_model: &str, requested: f32) -> f32 {
    if resolved_model.to_lowercase().contains("kimi-k2.5") {
        KIMI_K2_5_TEMPERATURE
    } else {
        requested
    }
}

fn has_recognized_prefix(lower: &str) -> bool {
    lower.starts_with(AGGREGATOR_PREFIX)
        || lower.starts_with(HOSTED_PREFIX)
        || VendorFamily::from_prefix(lower).is_some()
}

/// Vendors reachable directly, each with its own model prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorFamily {
    Zhipu,
    DashScope,
    Moonshot,
    Gemini,
    DeepSeek,
    Groq,
    Anthropic,
    OpenAi,
}

impl VendorFamily {
    /// Detection order; the first family whose keyword appears wins.
    pub const ALL: [VendorFamily; 8] = [
        VendorFamily::Zhipu,
        VendorFamily::DashScope,
        VendorFamily::Moonshot,
        VendorFamily::Gemini,
        VendorFamily::DeepSeek,
        VendorFamily::Groq,
        VendorFamily::Anthropic,
        VendorFamily::OpenAi,
    ];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            VendorFamily::Zhipu => &["glm", "zhipu", "zai"],
            VendorFamily::DashScope => &["qwen", "dashscope"],
            VendorFamily::Moonshot => &["moonshot", "kimi"],
            VendorFamily::Gemini => &["gemini"],
            VendorFamily::DeepSeek => &["deepseek"],
            VendorFamily::Groq => &["groq"],
            VendorFamily::Anthropic => &["anthropic", "claude"],
            VendorFamily::OpenAi => &["openai", "gpt"],
        }
    }

    /// The prefix this family's models get.
    pub fn prefix(&self) -> &'static str {
        match self {
            VendorFamily::Zhipu => "zai/",
            VendorFamily::DashScope => "dashscope/",
            VendorFamily::Moonshot => "moonshot/",
            VendorFamily::Gemini => "gemini/",
            VendorFamily::DeepSeek => "deepseek/",
            VendorFamily::Groq => "groq/",
            VendorFamily::Anthropic => "anthropic/",
            VendorFamily::OpenAi => "openai/",
        }
    }

    /// Prefixes accepted as already resolved for this family.
    fn accepted_prefixes(&self) -> &'static [&'static str] {
        match self {
            VendorFamily::Zhipu => &["zai/", "zhipu/"],
            VendorFamily::DashScope => &["dashscope/"],
            VendorFamily::Moonshot => &["moonshot/"],
            VendorFamily::Gemini => &["gemini/"],
            VendorFamily::DeepSeek => &["deepseek/"],
            VendorFamily::Groq => &["groq/"],
            VendorFamily::Anthropic => &["anthropic/"],
            VendorFamily::OpenAi => &["openai/"],
        }
    }

    /// Which credential this family reads.
    pub fn credential_slot(&self) -> CredentialSlot {
        match self {
            VendorFamily::Zhipu => CredentialSlot::Zai,
            VendorFamily::DashScope => CredentialSlot::DashScope,
            VendorFamily::Moonshot => CredentialSlot::Moonshot,
            VendorFamily::Gemini => CredentialSlot::Gemini,
            VendorFamily::DeepSeek => CredentialSlot::DeepSeek,
            VendorFamily::Groq => CredentialSlot::Groq,
            VendorFamily::Anthropic => CredentialSlot::Anthropic,
            VendorFamily::OpenAi => CredentialSlot::OpenAi,
        }
    }

    /// First family with a keyword in `model` (case-insensitive).
    pub fn detect(model: &str) -> Option<Self> {
        let lower = model.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| family.keywords().iter().any(|kw| lower.contains(kw)))
    }

    /// Family whose prefix `model` already carries (case-insensitive).
    pub fn from_prefix(model: &str) -> Option<Self> {
        let lower = model.to_lowercase();
        Self::ALL.into_iter().find(|family| {
            family
                .accepted_prefixes()
                .iter()
                .any(|prefix| lower.starts_with(prefix))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregator_detected_by_key_prefix() {
        assert_eq!(Dialect::detect(Some("sk-or-v1-abc"), None), Dialect::Aggregator);
    }

    #[test]
    fn aggregator_detected_by_endpoint() {
        assert_eq!(
            Dialect::detect(Some("anything"), Some("https://openrouter.ai/api/v1")),
            Dialect::Aggregator
        );
    }

    #[test]
    fn endpoint_override_means_self_hosted() {
        assert_eq!(
            Dialect::detect(Some("token"), Some("http://localhost:8000/v1")),
            Dialect::SelfHosted
        );
        assert_eq!(Dialect::detect(None, Some("http://gpu:8000/v1")), Dialect::SelfHosted);
    }

    #[test]
    fn no_override_means_direct() {
        assert_eq!(Dialect::detect(Some("sk-ant-123"), None), Dialect::DirectVendor);
        assert_eq!(Dialect::detect(None, None), Dialect::DirectVendor);
    }

    #[test]
    fn aggregator_prefixes_everything_once() {
        let d = Dialect::Aggregator;
        assert_eq!(
            d.resolve_model("anthropic/claude-opus-4-5"),
            "openrouter/anthropic/claude-opus-4-5"
        );
        assert_eq!(d.resolve_model("glm-4.7-flash"), "openrouter/glm-4.7-flash");
        assert_eq!(d.resolve_model("openrouter/foo"), "openrouter/foo");
    }

    #[test]
    fn vendor_prefixes_in_direct_mode() {
        let d = Dialect::DirectVendor;
        assert_eq!(d.resolve_model("glm-4.7-flash"), "zai/glm-4.7-flash");
        assert_eq!(d.resolve_model("qwen-max"), "dashscope/qwen-max");
        assert_eq!(d.resolve_model("kimi-k2.5"), "moonshot/kimi-k2.5");
        assert_eq!(d.resolve_model("gemini-2.0-flash"), "gemini/gemini-2.0-flash");
        assert_eq!(d.resolve_model("deepseek-chat"), "deepseek/deepseek-chat");
        assert_eq!(d.resolve_model("claude-sonnet-4"), "anthropic/claude-sonnet-4");
        assert_eq!(d.resolve_model("gpt-4o"), "openai/gpt-4o");
    }

    #[test]
    fn keyword_detection_ignores_case() {
        assert_eq!(Dialect::DirectVendor.resolve_model("Qwen-Max"), "dashscope/Qwen-Max");
    }

    #[test]
    fn existing_prefixes_are_left_alone() {
        let d = Dialect::DirectVendor;
        assert_eq!(d.resolve_model("zhipu/glm-4"), "zhipu/glm-4");
        assert_eq!(d.resolve_model("openrouter/qwen/qwen-max"), "openrouter/qwen/qwen-max");
        assert_eq!(d.resolve_model("anthropic/claude-opus-4-5"), "anthropic/claude-opus-4-5");
    }

    #[test]
    fn unknown_models_pass_through() {
        assert_eq!(Dialect::DirectVendor.resolve_model("llama3:8b"), "llama3:8b");
    }

    #[test]
    fn self_hosted_composes_with_vendor_prefix() {
        let d = Dialect::SelfHosted;
        assert_eq!(d.resolve_model("glm-4.7-flash"), "hosted_vllm/zai/glm-4.7-flash");
        assert_eq!(d.resolve_model("meta-llama/Llama-3-8B"), "hosted_vllm/meta-llama/Llama-3-8B");
    }

    #[test]
    fn resolution_is_idempotent() {
        let models = [
            "glm-4.7-flash",
            "qwen-max",
            "kimi-k2.5",
            "gemini-pro",
            "gpt-4o",
            "openrouter/foo",
            "llama3",
            "Moonshot-v1-8k",
        ];
        for dialect in [Dialect::Aggregator, Dialect::SelfHosted, Dialect::DirectVendor] {
            for model in models {
                let once = dialect.resolve_model(model);
                let twice = dialect.resolve_model(&once);
                assert_eq!(once, twice, "{dialect} not idempotent for {model}");
            }
        }
    }

    #[test]
    fn kimi_k2_5_pins_temperature() {
        assert_eq!(effective_temperature("moonshot/kimi-k2.5", 0.2), 1.0);
        assert_eq!(effective_temperature("openrouter/moonshotai/Kimi-K2.5", 0.0), 1.0);
        assert_eq!(effective_temperature("moonshot/kimi-k2", 0.2), 0.2);
    }

    #[test]
    fn family_lookup_by_prefix() {
        assert_eq!(VendorFamily::from_prefix("zai/glm-4"), Some(VendorFamily::Zhipu));
        assert_eq!(VendorFamily::from_prefix("zhipu/glm-4"), Some(VendorFamily::Zhipu));
        assert_eq!(VendorFamily::from_prefix("glm-4"), None);
    }
}
