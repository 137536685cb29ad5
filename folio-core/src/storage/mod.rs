//! Durable key-value storage and the transcript mirror built on it.

mod file;
mod history;
mod memory;

pub use file::FileStore;
pub use history::{HISTORY_KEY, TranscriptStore};
pub use memory::MemoryStore;

/// String key-value storage, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}
