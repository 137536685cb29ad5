/// Errors surfaced to the voice controls.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Recognition or synthesis is missing on this machine.
    #[error("voice input is not supported here")]
    Unsupported,

    #[error("failed to start listening: {0}")]
    Recognition(String),

    #[error("failed to speak: {0}")]
    Synthesis(String),
}
