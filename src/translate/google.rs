//! Google Translate API v2 provider.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ProviderError, REQUEST_TIMEOUT, Translator, ensure_success, non_empty};

pub const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    source: String,
    target: String,
}

impl GoogleTranslator {
    pub fn new(
        endpoint: String,
        api_key: String,
        source: String,
        target: String,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            source,
            target,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, phrase: &str) -> Result<String, ProviderError> {
        let body = json!({
            "q": [phrase],
            "source": self.source,
            "target": self.target,
            "format": "text",
        });
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let parsed: GoogleResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let translation = parsed.data.translations.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidResponse("missing 'data.translations' entry".to_string())
        })?;
        non_empty(translation.translated_text)
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, query_param},
    };

    fn translator(server: &MockServer) -> GoogleTranslator {
        GoogleTranslator::new(
            server.uri(),
            "test-key".to_string(),
            "zh".to_string(),
            "en".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_translate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({"q": ["数据源"], "format": "text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [{"translatedText": "Data source"}]}
            })))
            .mount(&server)
            .await;

        let result = translator(&server).translate("数据源").await.unwrap();
        assert_eq!(result, "Data source");
    }

    #[tokio::test]
    async fn test_empty_translations_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"translations": []}})),
            )
            .mount(&server)
            .await;

        let err = translator(&server).translate("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = translator(&server).translate("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 403, .. }));
    }
}
