use super::chat::model::GeminiChatModel;
use crate::client::Client;
use crate::{ChatModel, ModelProvider};
use anyhow::Context;
use reqwest::header::{self, HeaderValue};
use std::sync::Arc;

pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

impl GeminiProvider {
    pub fn default(api_key: &str) -> anyhow::Result<Self> {
        Self::new(DEFAULT_BASE_URL, api_key)
    }

    /// Create a provider with a custom base URL (e.g., for proxying).
    /// The API version path (/v1beta) is automatically appended.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key).context("API key is not a valid header value")?,
        );
        let base_url = base_url.trim_end_matches('/');
        Ok(GeminiProvider {
            client: Client::with_headers(headers)?,
            base_url: format!("{}/{}", base_url, API_VERSION),
        })
    }

    /// Build from GEMINI_API_KEY, with GEMINI_BASE_URL or `fallback_base_url` as endpoint
    pub fn from_env(fallback_base_url: Option<&str>) -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
        let base_url = std::env::var("GEMINI_BASE_URL")
            .ok()
            .or_else(|| fallback_base_url.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url, &api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ModelProvider for GeminiProvider {
    fn create_chat_model(&self, model_name: &str) -> Option<Arc<dyn ChatModel + Send + Sync>> {
        if model_name.trim().is_empty() {
            return None;
        }
        Some(Arc::new(GeminiChatModel::new(
            self.client.clone(),
            self.base_url.clone(),
            model_name.to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_api_version() {
        let provider = GeminiProvider::new("http://localhost:8080/", "key").unwrap();
        assert_eq!(provider.base_url(), "http://localhost:8080/v1beta");
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        assert!(GeminiProvider::new(DEFAULT_BASE_URL, "bad\nkey").is_err());
    }

    #[test]
    fn test_blank_model_name_creates_nothing() {
        let provider = GeminiProvider::default("key").unwrap();
        assert!(provider.create_chat_model("  ").is_none());
        let model = provider.create_chat_model("gemini-2.5-flash").unwrap();
        assert_eq!(model.name(), "gemini-2.5-flash");
    }
}
