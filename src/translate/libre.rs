//! LibreTranslate-compatible provider.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ProviderError, REQUEST_TIMEOUT, Translator, ensure_success, non_empty};

pub const DEFAULT_ENDPOINT: &str = "https://libretranslate.com/translate";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: String,
}

pub struct LibreTranslator {
    client: reqwest::Client,
    endpoint: String,
    source: String,
    target: String,
    api_key: Option<String>,
}

impl LibreTranslator {
    pub fn new(
        endpoint: String,
        source: String,
        target: String,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            source,
            target,
            api_key,
        })
    }
}

#[async_trait]
impl Translator for LibreTranslator {
    async fn translate(&self, phrase: &str) -> Result<String, ProviderError> {
        let mut body = json!({
            "q": phrase,
            "source": self.source,
            "target": self.target,
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            body["api_key"] = json!(key);
        }

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let response = ensure_success(response).await?;
        let parsed: LibreResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        non_empty(parsed.translated_text)
    }

    fn name(&self) -> &str {
        "libre"
    }
}
