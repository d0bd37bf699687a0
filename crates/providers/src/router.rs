//! Provider router — selects the model transport based on config.

use std::sync::Arc;
use shellsmith_config::AppConfig;
use shellsmith_core::error::ProviderError;
use shellsmith_core::provider::Provider;
use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Providers that run locally and need no API key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

/// Build the configured default provider.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    build_provider(&config.default_provider, config)
}

/// Build a provider by name, taking key and URL from the matching
/// `[providers.<name>]` table or the top-level `api_key`.
pub fn build_provider(name: &str, config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone());
    let api_url = provider_config.and_then(|p| p.api_url.clone());

    let api_key = match api_key {
        Some(key) => key,
        None if KEYLESS_PROVIDERS.contains(&name) => String::new(),
        None => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{name}'"
            )));
        }
    };

    if name == "gemini" {
        let mut provider = GeminiProvider::new(api_key);
        if let Some(url) = api_url {
            provider = provider.with_base_url(url);
        }
        return Ok(Arc::new(provider));
    }

    let base_url = api_url
        .or_else(|| default_base_url(name))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{name}': set providers.{name}.api_url"
            ))
        })?;

    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}
