use async_trait::async_trait;
use std::sync::Arc;

pub mod api;
mod client;
pub mod providers;
pub mod traffic_log;

pub use api::*;
pub use client::Client;
pub use providers::GeminiProvider;

#[async_trait]
pub trait ChatModel {
    fn name(&self) -> &str;

    /// Send the full conversation and wait for one assistant reply.
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage>;
}

// Blanket implementation for Arc<dyn ChatModel> to make it easier to work with
#[async_trait]
impl ChatModel for Arc<dyn ChatModel + Send + Sync> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        (**self).chat(request).await
    }
}

pub trait ModelProvider {
    /// Create a chat model by name, returned as Arc for sharing across tasks
    fn create_chat_model(&self, model_name: &str) -> Option<Arc<dyn ChatModel + Send + Sync>>;
}
