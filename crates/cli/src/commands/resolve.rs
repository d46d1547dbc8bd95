//! `relayclaw resolve`: show the backend call a model id turns into.

use std::sync::Arc;

use async_trait::async_trait;
use relayclaw_config::AppConfig;
use relayclaw_core::error::ProviderError;
use relayclaw_core::provider::CompletionRequest;
use relayclaw_providers::{
    BackendCall, BackendReply, CredentialSlot, Credentials, LlmBackend, RoutingProvider,
};

/// Stands in for the network client; `resolve` never calls it.
struct Offline;

#[async_trait]
impl LlmBackend for Offline {
    async fn invoke(&self, _call: BackendCall) -> Result<BackendReply, ProviderError> {
        Err(ProviderError::NotConfigured("no backend client in this build".into()))
    }
}

pub fn run(
    config: &AppConfig,
    model: Option<&str>,
    temperature: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = RoutingProvider::from_config(config, Arc::new(Offline), Credentials::from_env());
    println!("{}", serde_json::to_string_pretty(&describe(&provider, model, temperature))?);
    Ok(())
}

fn describe(
    provider: &RoutingProvider,
    model: Option<&str>,
    temperature: f32,
) -> serde_json::Value {
    let mut request = CompletionRequest::new(Vec::new()).with_temperature(temperature);
    if let Some(model) = model {
        request = request.with_model(model);
    }
    let call = provider.build_call(&request);
    let slot = CredentialSlot::for_model(&call.model);

    serde_json::json!({
        "dialect": provider.dialect().as_str(),
        "model": call.model,
        "temperature": call.temperature,
        "api_base": call.api_base,
        "credential": slot.map(|s| s.env_name()),
        "credential_set": call.api_key.is_some(),
    })
}
