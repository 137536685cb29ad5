//! The ordered list of turns shown to the user.
//!
//! A transcript always starts with the assistant greeting. The greeting is
//! display-only: it is never part of the history sent to the model.

use crate::message::{ChatMessage, Sender};

#[derive(Clone, Debug, PartialEq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting)],
        }
    }

    /// Rebuild from stored messages, prepending the greeting when the stored
    /// list does not already open with an assistant turn.
    pub fn from_messages(greeting: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        match messages.first() {
            Some(first) if first.sender() == Sender::Assistant => Self { messages },
            _ => {
                let mut transcript = Self::new(greeting);
                transcript.messages.extend(messages);
                transcript
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Everything after the greeting
    pub fn conversation(&self) -> &[ChatMessage] {
        &self.messages[1..]
    }

    pub fn greeting(&self) -> &ChatMessage {
        &self.messages[0]
    }

    pub fn last(&self) -> &ChatMessage {
        // never empty
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_pristine(&self) -> bool {
        self.messages.len() == 1
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Remove the most recent entry equal to `message`. The greeting is never removed.
    pub fn rollback(&mut self, message: &ChatMessage) -> bool {
        match self.messages.iter().rposition(|m| m == message) {
            Some(index) if index > 0 => {
                self.messages.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Drop everything but the greeting
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_transcript_is_pristine() {
        let transcript = Transcript::new("Hello!");
        assert!(transcript.is_pristine());
        assert!(transcript.conversation().is_empty());
        assert_eq!(transcript.last(), &ChatMessage::assistant("Hello!"));
    }

    #[test]
    fn test_stored_messages_without_greeting_get_one() {
        let transcript = Transcript::from_messages(
            "Hello!",
            vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hey")],
        );
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.greeting().text(), "Hello!");

        let stored = Transcript::from_messages(
            "Hello!",
            vec![ChatMessage::assistant("Old greeting"), ChatMessage::user("Hi")],
        );
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.greeting().text(), "Old greeting");

        assert!(Transcript::from_messages("Hello!", Vec::new()).is_pristine());
    }

    #[test]
    fn test_rollback_removes_last_matching_message_only() {
        let mut transcript = Transcript::new("Hello!");
        transcript.push(ChatMessage::user("again"));
        transcript.push(ChatMessage::assistant("ok"));
        transcript.push(ChatMessage::user("again"));

        assert!(transcript.rollback(&ChatMessage::user("again")));
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last(), &ChatMessage::assistant("ok"));
    }

    #[test]
    fn test_rollback_never_removes_greeting() {
        let mut transcript = Transcript::new("Hello!");
        assert!(!transcript.rollback(&ChatMessage::assistant("Hello!")));
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_reset_keeps_greeting() {
        let mut transcript = Transcript::new("Hello!");
        transcript.push(ChatMessage::user("Hi"));
        transcript.reset();
        assert!(transcript.is_pristine());
        assert_eq!(transcript.greeting().text(), "Hello!");
    }
}
