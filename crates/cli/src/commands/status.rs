//! `relayclaw status`: show what the current config would run.

use std::sync::Arc;

use relayclaw_channels::ChannelManager;
use relayclaw_config::AppConfig;
use relayclaw_core::bus::MessageBus;
use relayclaw_providers::Dialect;

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&report(config))?);
    Ok(())
}

fn report(config: &AppConfig) -> serde_json::Value {
    let manager = ChannelManager::new(Arc::new(config.clone()), Arc::new(MessageBus::default()));
    let creds = config.provider_credentials();
    let dialect = Dialect::detect(creds.api_key.as_deref(), creds.api_base.as_deref());

    serde_json::json!({
        "config_path": AppConfig::config_path(),
        "default_model": config.default_model,
        "provider": {
            "dialect": dialect.as_str(),
            "api_key_set": creds.api_key.is_some(),
            "api_base": creds.api_base,
        },
        "channels": manager.status(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_enabled_channels() {
        let config = AppConfig::from_toml_str(
            r#"
api_key = "sk-or-v1-abc"

[channels.discord]
enabled = true
token = "t"

[channels.telegram]
enabled = false
token = "t"
"#,
        )
        .unwrap();

        let report = report(&config);
        assert_eq!(report["provider"]["dialect"], "openrouter");
        assert_eq!(report["provider"]["api_key_set"], true);
        assert_eq!(report["channels"]["discord"]["enabled"], true);
        assert_eq!(report["channels"]["discord"]["running"], false);
        assert!(report["channels"].get("telegram").is_none());
        assert!(!report.to_string().contains("sk-or-v1-abc"));
    }
}
