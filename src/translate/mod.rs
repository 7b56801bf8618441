//! Translation capability and its HTTP providers.
//!
//! The coordinator only sees the [`Translator`] trait, so providers can be
//! swapped (or scripted in tests) without touching the batching logic.

pub mod google;
pub mod libre;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, ProviderKind};
use crate::error::{Error, Result};

pub use google::GoogleTranslator;
pub use libre::LibreTranslator;

/// Per-request HTTP timeout; the batch timeout is enforced separately by the coordinator.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure of a single translate call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("translation request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("translation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid translation response: {0}")]
    InvalidResponse(String),

    #[error("translation service returned an empty result")]
    EmptyResult,
}

/// Translates one source-language phrase into the target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, phrase: &str) -> std::result::Result<String, ProviderError>;

    /// Provider name, used in logs.
    fn name(&self) -> &str;
}

/// Read a successful response body or turn the status into a [`ProviderError`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn non_empty(text: String) -> std::result::Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyResult)
    } else {
        Ok(text)
    }
}

/// Build the provider selected in the configuration.
pub fn build_translator(config: &Config) -> Result<Box<dyn Translator>> {
    let provider = &config.provider;
    let source = config.source_language.clone();
    let target = config.target_language.clone();

    let translator: Box<dyn Translator> = match provider.kind {
        ProviderKind::Libre => {
            let endpoint = provider
                .endpoint
                .clone()
                .unwrap_or_else(|| libre::DEFAULT_ENDPOINT.to_string());
            let api_key = provider
                .api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok());
            Box::new(LibreTranslator::new(endpoint, source, target, api_key)?)
        }
        ProviderKind::Google => {
            let var = provider
                .api_key_env
                .as_deref()
                .unwrap_or(google::DEFAULT_API_KEY_ENV);
            let api_key = std::env::var(var)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "the google provider needs an API key in the {var} environment variable"
                    ))
                })?;
            let endpoint = provider
                .endpoint
                .clone()
                .unwrap_or_else(|| google::DEFAULT_ENDPOINT.to_string());
            Box::new(GoogleTranslator::new(endpoint, api_key, source, target)?)
        }
    };
    Ok(translator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn test_build_default_translator() {
        let translator = build_translator(&Config::default()).unwrap();
        assert_eq!(translator.name(), "libre");
    }

    #[test]
    fn test_google_requires_api_key() {
        let config = Config {
            provider: ProviderConfig {
                kind: ProviderKind::Google,
                endpoint: None,
                api_key_env: Some("TRANSMARK_TEST_UNSET_GOOGLE_KEY".to_string()),
            },
            ..Default::default()
        };
        let err = build_translator(&config).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("TRANSMARK_TEST_UNSET_GOOGLE_KEY"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("hello".to_string()).unwrap(), "hello");
        assert!(matches!(non_empty("  ".to_string()), Err(ProviderError::EmptyResult)));
    }
}
