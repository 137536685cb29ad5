use super::api::{GenerateContentRequest, GenerateContentResponse};
use crate::client::Client;
use crate::traffic_log;
use crate::{ChatMessage, ChatModel, ChatRequest};
use async_trait::async_trait;

pub struct GeminiChatModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl GeminiChatModel {
    pub fn new(client: Client, base_url: String, model_name: String) -> Self {
        GeminiChatModel {
            client,
            base_url,
            model_name,
        }
    }

    fn endpoint(&self) -> String {
        // Listed model ids already carry the "models/" prefix, configured ones usually don't.
        let model = self.model_name.trim_start_matches("models/");
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        let api_request = GenerateContentRequest::try_from(request)?;
        traffic_log::log_request(&self.model_name, &api_request);

        match self
            .client
            .post::<_, _, GenerateContentResponse>(self.endpoint(), &api_request)
            .await
        {
            Ok(response) => {
                traffic_log::log_response(&self.model_name, &response);
                ChatMessage::try_from(response)
            }
            Err(e) => {
                traffic_log::log_error(&self.model_name, &e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    #[test]
    fn test_endpoint_normalizes_model_prefix() {
        let client = Client::with_headers(HeaderMap::new()).unwrap();
        let bare = GeminiChatModel::new(client.clone(), "http://x/v1beta".into(), "gemini-2.5-flash".into());
        let prefixed = GeminiChatModel::new(client, "http://x/v1beta".into(), "models/gemini-2.5-flash".into());
        assert_eq!(bare.endpoint(), "http://x/v1beta/models/gemini-2.5-flash:generateContent");
        assert_eq!(bare.endpoint(), prefixed.endpoint());
    }
}
