//! LLM provider implementations for NanoClaw.
//!
//! All providers implement the `nanoclaw_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use nanoclaw_config::AppConfig;
use nanoclaw_core::error::ProviderError;

/// Build the configured provider.
///
/// `[providers.<name>]` sections override the shared API key, base URL, and
/// model for that provider.
pub fn from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let name = config.default_provider.as_str();
    let section = config.providers.get(name);

    let api_key = section
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone());

    let mut provider = match name {
        "openrouter" => {
            let key = api_key.ok_or(ProviderError::NotConfigured("openrouter".into()))?;
            OpenAiCompatProvider::openrouter(key)
        }
        "openai" => {
            let key = api_key.ok_or(ProviderError::NotConfigured("openai".into()))?;
            OpenAiCompatProvider::openai(key)
        }
        "ollama" => OpenAiCompatProvider::ollama(
            section.and_then(|p| p.api_url.as_deref()),
        ),
        other => {
            let url = section
                .and_then(|p| p.api_url.clone())
                .ok_or_else(|| ProviderError::NotConfigured(other.into()))?;
            OpenAiCompatProvider::new(other, url, api_key.unwrap_or_default())
        }
    };

    let model = section
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());
    provider.set_default_model(model);

    Ok(provider)
}
