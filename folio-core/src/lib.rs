pub mod error;
pub mod export;
pub mod instruction;
pub mod manager;
pub mod markdown;
pub mod message;
pub mod session;
pub mod storage;
pub mod transcript;
pub mod voice;

pub use error::{ChatError, ExportError};
pub use export::ExportFormat;
pub use instruction::SystemInstruction;
pub use manager::{CONNECTION_ERROR, ChatSessionManager, ManagerEvent};
pub use markdown::{Inline, RenderBlock, parse_inline, plain_text, render, render_html};
pub use message::{ChatMessage, Origin, Sender};
pub use session::ModelSession;
pub use storage::{FileStore, KeyValueStore, MemoryStore, TranscriptStore};
pub use transcript::Transcript;
pub use voice::{NoVoice, VoicePort};
