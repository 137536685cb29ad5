//! Error types surfaced by the chat core.

use std::path::PathBuf;

/// Errors raised while running the conversation.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The model request failed (network, non-success status, empty reply).
    #[error("model request failed: {0}")]
    Transport(String),

    /// The stored history could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The system instruction template failed to render.
    #[error("failed to build system instruction: {0}")]
    Instruction(#[from] askama::Error),
}

/// Errors raised while exporting the transcript.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("there is nothing to export yet")]
    Empty,

    #[error("failed to build PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to render HTML: {0}")]
    Html(#[from] askama::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export task failed: {0}")]
    Task(String),
}
