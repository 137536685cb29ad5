use super::KeyValueStore;
use crate::error::ChatError;
use crate::message::ChatMessage;
use crate::transcript::Transcript;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key of the transcript.
pub const HISTORY_KEY: &str = "ai_chat_history";

/// Mirrors the transcript into a [`KeyValueStore`] as a JSON array of
/// `{sender, text}` objects.
#[derive(Clone)]
pub struct TranscriptStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl TranscriptStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_key(store, HISTORY_KEY)
    }

    pub fn with_key(store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        Self {
            store: Arc::new(store),
            key: key.into(),
        }
    }

    /// Read and parse the stored messages. `Ok(None)` when nothing usable is stored.
    pub fn try_load(&self) -> Result<Option<Vec<ChatMessage>>, ChatError> {
        let raw = self
            .store
            .get(&self.key)
            .map_err(|e| ChatError::Persistence(format!("{e:#}")))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let messages: Vec<ChatMessage> = serde_json::from_str(&raw)
            .map_err(|e| ChatError::Persistence(format!("stored history is corrupt: {e}")))?;
        if messages.is_empty() {
            return Ok(None);
        }
        Ok(Some(messages))
    }

    /// Load the stored transcript. Corrupt or unreadable values are logged and
    /// treated as no history.
    pub fn load(&self, greeting: &str) -> Option<Transcript> {
        match self.try_load() {
            Ok(Some(messages)) => {
                debug!(count = messages.len(), "Restored chat history");
                Some(Transcript::from_messages(greeting, messages))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Ignoring stored chat history");
                None
            }
        }
    }

    /// Persist the transcript; a pristine transcript clears the key instead.
    pub fn save(&self, transcript: &Transcript) -> Result<(), ChatError> {
        if transcript.is_pristine() {
            return self.clear();
        }
        let json = serde_json::to_string(transcript.messages())
            .map_err(|e| ChatError::Persistence(e.to_string()))?;
        self.store
            .set(&self.key, &json)
            .map_err(|e| ChatError::Persistence(format!("{e:#}")))
    }

    pub fn clear(&self) -> Result<(), ChatError> {
        self.store
            .remove(&self.key)
            .map_err(|e| ChatError::Persistence(format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_round_trip() {
        let backing = MemoryStore::new();
        let store = TranscriptStore::new(backing.clone());

        let mut transcript = Transcript::new("Hello!");
        transcript.push(ChatMessage::user("Hi"));
        transcript.push(ChatMessage::assistant("Hey"));
        store.save(&transcript).unwrap();

        assert_eq!(
            backing.get(HISTORY_KEY).unwrap().as_deref(),
            Some(r#"[{"sender":"ai","text":"Hello!"},{"sender":"user","text":"Hi"},{"sender":"ai","text":"Hey"}]"#)
        );
        assert_eq!(store.load("Hello!"), Some(transcript));
    }

    #[test]
    fn test_pristine_save_clears() {
        let backing = MemoryStore::new();
        backing.set(HISTORY_KEY, "[]").unwrap();
        let store = TranscriptStore::new(backing.clone());

        store.save(&Transcript::new("Hello!")).unwrap();
        assert!(backing.is_empty());
    }

    #[test]
    fn test_corrupt_or_empty_value_means_no_history() {
        let backing = MemoryStore::new();
        let store = TranscriptStore::new(backing.clone());

        backing.set(HISTORY_KEY, "{not json").unwrap();
        assert!(matches!(store.try_load(), Err(ChatError::Persistence(_))));
        assert_eq!(store.load("Hello!"), None);

        backing.set(HISTORY_KEY, "[]").unwrap();
        assert_eq!(store.load("Hello!"), None);

        backing.set(HISTORY_KEY, r#"{"sender":"user","text":"not an array"}"#).unwrap();
        assert_eq!(store.load("Hello!"), None);
    }
}
