//! A conversation with the language model bound to one system instruction.

use crate::error::ChatError;
use crate::instruction::SystemInstruction;
use crate::transcript::Transcript;
use chrono::NaiveDate;
use llm::{ChatMessage, ChatModel, ChatRequest};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Holds the instruction and the model-side history. The greeting is never
/// part of the history.
///
/// `send` takes `&mut self`, so overlapping sends on one session are ruled
/// out by the borrow checker; the manager moves the session into the request
/// task and gets it back with the outcome.
pub struct ModelSession {
    model: Arc<dyn ChatModel + Send + Sync>,
    instruction: ChatMessage,
    instruction_date: NaiveDate,
    history: Vec<ChatMessage>,
}

impl ModelSession {
    pub fn new(
        model: Arc<dyn ChatModel + Send + Sync>,
        instruction: &SystemInstruction,
        transcript: &Transcript,
    ) -> Self {
        let history = transcript
            .conversation()
            .iter()
            .map(ChatMessage::from)
            .collect::<Vec<_>>();
        debug!(
            model = model.name(),
            history = history.len(),
            date = %instruction.date(),
            "Creating model session"
        );
        Self {
            model,
            instruction: ChatMessage::system(instruction.text()),
            instruction_date: instruction.date(),
            history,
        }
    }

    /// Send one user turn and wait for the reply text. History only grows
    /// when the reply arrives.
    #[instrument(level = "debug", skip(self, text), fields(model = self.model.name()))]
    pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let user = ChatMessage::user(text);
        let request = ChatRequest::new(
            std::iter::once(&self.instruction)
                .chain(self.history.iter())
                .chain(std::iter::once(&user)),
        );

        let reply = self
            .model
            .chat(&request)
            .await
            .map_err(|e| ChatError::Transport(format!("{e:#}")))?;
        let text = reply.get_text().to_string();

        self.history.push(user);
        self.history.push(ChatMessage::assistant(text.clone()));
        Ok(text)
    }

    pub fn instruction_date(&self) -> NaiveDate {
        self.instruction_date
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }
}
