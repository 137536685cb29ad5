use serde::{Deserialize, Serialize};

/// Who produced a transcript entry.
///
/// Stored as `"user"` / `"ai"`; `"assistant"` is read as an alias.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

/// One entry of the visible transcript. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    sender: Sender,
    text: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}

impl From<&ChatMessage> for llm::ChatMessage {
    fn from(message: &ChatMessage) -> Self {
        match message.sender {
            Sender::User => llm::ChatMessage::user(message.text.clone()),
            Sender::Assistant => llm::ChatMessage::assistant(message.text.clone()),
        }
    }
}

/// Where a user turn came from. Only voice turns get their reply spoken.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    Typed,
    Prompt,
    Voice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&ChatMessage::assistant("Hi")).unwrap();
        assert_eq!(json, r#"{"sender":"ai","text":"Hi"}"#);

        let parsed: ChatMessage =
            serde_json::from_str(r#"{"sender":"assistant","text":"Hi"}"#).unwrap();
        assert_eq!(parsed, ChatMessage::assistant("Hi"));
    }

    #[test]
    fn test_unknown_sender_is_rejected() {
        assert!(serde_json::from_str::<ChatMessage>(r#"{"sender":"bot","text":"x"}"#).is_err());
    }

    #[test]
    fn test_maps_to_model_roles() {
        let mapped = llm::ChatMessage::from(&ChatMessage::user("q"));
        assert_eq!(mapped.role, llm::Role::User);
        let mapped = llm::ChatMessage::from(&ChatMessage::assistant("a"));
        assert_eq!(mapped.role, llm::Role::Assistant);
    }
}
