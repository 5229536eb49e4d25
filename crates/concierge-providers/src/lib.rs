//! # concierge-providers
//!
//! Reasoning backends for the intent classifier and the orchestrator handoff.

pub mod anthropic;
pub mod openai;

use concierge_core::{
    config::{resolve_api_key, ProviderConfig},
    error::ConciergeError,
    traits::Provider,
};
use std::sync::Arc;
use std::time::Duration;

/// Request timeout applied to every provider HTTP client.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Build the configured provider. `Ok(None)` means "no reasoning backend".
pub fn build_provider(cfg: &ProviderConfig) -> Result<Option<Arc<dyn Provider>>, ConciergeError> {
    match cfg.default.as_str() {
        "none" => Ok(None),
        "anthropic" => {
            let ac = cfg.anthropic.clone().unwrap_or_default();
            let key = resolve_api_key(&ac.api_key, "ANTHROPIC_API_KEY");
            Ok(Some(Arc::new(anthropic::AnthropicProvider::from_config(
                key, ac.model,
            ))))
        }
        "openai" => {
            let oc = cfg.openai.clone().unwrap_or_default();
            let key = resolve_api_key(&oc.api_key, "OPENAI_API_KEY");
            Ok(Some(Arc::new(openai::OpenAiProvider::from_config(
                oc.base_url,
                key,
                oc.model,
            ))))
        }
        other => Err(ConciergeError::Config(format!(
            "unsupported provider: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_none() {
        let cfg = ProviderConfig::default();
        assert!(build_provider(&cfg).unwrap().is_none());
    }

    #[test]
    fn test_build_provider_openai() {
        let cfg = ProviderConfig {
            default: "openai".into(),
            ..Default::default()
        };
        let provider = build_provider(&cfg).unwrap().unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_build_provider_unknown() {
        let cfg = ProviderConfig {
            default: "ollama".into(),
            ..Default::default()
        };
        assert!(build_provider(&cfg).is_err());
    }
}
