use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
    System,
}

/// One provider-neutral conversation turn.
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn get_text(&self) -> &str {
        &self.text
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    pub(crate) messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Create a new chat request from an iterator of message references
    ///
    /// Accepts slices, `Vec<&ChatMessage>` or chained iterators, so callers can
    /// splice a system instruction, stored history and the new turn together
    /// without building an intermediate vector. Messages are cloned once.
    pub fn new<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>) -> Self {
        ChatRequest {
            messages: messages.into_iter().cloned().collect(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Concatenated text of all system messages, if any
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.text.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_chains_messages_in_order() {
        let system = ChatMessage::system("be brief");
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let next = ChatMessage::user("how are you?");

        let request = ChatRequest::new(
            std::iter::once(&system)
                .chain(history.iter())
                .chain(std::iter::once(&next)),
        );

        let roles: Vec<Role> = request.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(request.system_text().as_deref(), Some("be brief"));
    }

    #[test]
    fn test_request_without_system_message() {
        let history = vec![ChatMessage::user("hi")];
        let request = ChatRequest::new(&history);
        assert!(request.system_text().is_none());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","text":"ok"}"#);
    }
}
