//! Thin client over a LibreTranslate-compatible service.

use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

const DEFAULT_TRANSLATE_URL: &str = "https://libretranslate.de";

#[derive(Clone)]
pub struct TranslationClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl TranslationClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_TRANSLATE_URL.to_string()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("TRANSLATE_URL").ok())
    }

    /// Translate `text` into `target`. `source` defaults to auto-detect.
    pub async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ApiError> {
        let body = json!({
            "q": text,
            "source": source.unwrap_or("auto"),
            "target": target,
            "format": "text",
        });

        let response = self
            .http
            .post(format!("{}/translate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream_error("translate", e))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "translation service rejected request");
            return Err(ApiError::upstream("Error in translation service"));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| upstream_error("translate", e))?;
        Ok(parsed.translated_text)
    }

    /// Languages the upstream service supports, passed through verbatim.
    pub async fn supported_languages(&self) -> Result<serde_json::Value, ApiError> {
        let response = self
            .http
            .get(format!("{}/languages", self.base_url))
            .send()
            .await
            .map_err(|e| upstream_error("languages", e))?;

        if !response.status().is_success() {
            return Err(ApiError::upstream("Error in translation service"));
        }

        response
            .json()
            .await
            .map_err(|e| upstream_error("languages", e))
    }
}

fn upstream_error(op: &str, err: reqwest::Error) -> ApiError {
    tracing::error!(%op, error = %err, "translation service call failed");
    ApiError::upstream("Error in translation service")
}
