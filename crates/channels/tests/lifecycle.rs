//! Manager lifecycle against the built-in adapters, driven by TOML config.

use std::sync::Arc;
use std::time::Duration;

use relayclaw_channels::ChannelManager;
use relayclaw_config::AppConfig;
use relayclaw_core::bus::MessageBus;
use relayclaw_core::channel::OutboundMessage;

const CONFIG: &str = r#"
[channels.telegram]
enabled = true
token = "123:abc"
allow_from = ["alice"]

[channels.discord]
enabled = true
token = "discord-token"

[channels.whatsapp]
enabled = false
bridge_url = "ws://localhost:3001"

[channels.feishu]
enabled = true
app_id = "cli_a"
"#;

const RELOADED: &str = r#"
[channels.telegram]
enabled = true
token = "123:abc"
allow_from = ["alice", "bob"]

[channels.discord]
enabled = false
token = "discord-token"

[channels.whatsapp]
enabled = true
bridge_url = "ws://localhost:3001"
"#;

fn parse(toml: &str) -> Arc<AppConfig> {
    Arc::new(AppConfig::from_toml_str(toml).unwrap())
}

async fn wait_for(manager: &ChannelManager, mut cond: impl FnMut(&ChannelManager) -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond(manager) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn start_reload_stop() {
    let bus = Arc::new(MessageBus::default());
    let manager = Arc::new(ChannelManager::new(parse(CONFIG), bus.clone()));

    // feishu is enabled but lacks app_secret
    assert_eq!(manager.enabled_channels(), vec!["discord", "telegram"]);

    let running = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.start_all().await })
    };
    wait_for(&manager, |m| m.status().values().all(|s| s.running)).await;

    bus.publish_outbound(OutboundMessage::new("telegram", "42", "hello")).await;
    bus.publish_outbound(OutboundMessage::new("slack", "42", "nobody home")).await;
    wait_for(&manager, |m| m.bus().outbound_size() == 0).await;

    // disable discord, enable whatsapp
    manager.update_config(parse(RELOADED)).await;

    assert_eq!(manager.enabled_channels(), vec!["telegram", "whatsapp"]);
    wait_for(&manager, |m| m.status().get("whatsapp").is_some_and(|s| s.running)).await;

    manager.stop_all().await;
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap();
    assert!(manager.status().values().all(|s| !s.running));
}

#[tokio::test]
async fn empty_config_starts_nothing() {
    let manager =
        ChannelManager::new(Arc::new(AppConfig::default()), Arc::new(MessageBus::default()));
    manager.start_all().await;
    assert!(manager.status().is_empty());
    manager.stop_all().await;
}
