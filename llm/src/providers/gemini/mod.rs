pub(crate) mod chat;
mod provider;

pub use chat::model::GeminiChatModel;
pub use provider::GeminiProvider;
