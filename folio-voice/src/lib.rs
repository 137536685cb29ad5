//! Speech I/O for the chat assistant
//!
//! This crate provides:
//! - Recognizer and synthesizer traits with event channels
//! - The voice coordinator that drives them from the chat manager
//! - Command-line backends (an STT program and a TTS program such as `espeak-ng`)
//! - Unsupported fallbacks used when nothing is configured

pub mod command_backend;
pub mod coordinator;
pub mod error;
pub mod traits;
pub mod types;
pub mod unsupported;

pub use command_backend::{CommandRecognizer, CommandSynthesizer};
pub use coordinator::VoiceCoordinator;
pub use error::VoiceError;
pub use traits::{SpeechRecognizer, SpeechSynthesizer};
pub use types::{RecognitionEvent, SynthesisEvent};
pub use unsupported::{UnsupportedRecognizer, UnsupportedSynthesizer};

use config::VoiceSettings;

/// Build a coordinator from the configured commands. Missing or unusable
/// commands yield an unsupported coordinator.
pub fn from_settings(settings: &VoiceSettings) -> VoiceCoordinator {
    let recognizer: anyhow::Result<Box<dyn SpeechRecognizer>> =
        match settings.recognizer_command.clone() {
            Some(command) => CommandRecognizer::new(command).map(|r| Box::new(r) as Box<dyn SpeechRecognizer>),
            None => UnsupportedRecognizer::new().map(|r| Box::new(r) as Box<dyn SpeechRecognizer>),
        };
    let synthesizer: anyhow::Result<Box<dyn SpeechSynthesizer>> =
        match settings.synthesizer_command.clone() {
            Some(command) => CommandSynthesizer::new(command).map(|s| Box::new(s) as Box<dyn SpeechSynthesizer>),
            None => UnsupportedSynthesizer::new().map(|s| Box::new(s) as Box<dyn SpeechSynthesizer>),
        };
    VoiceCoordinator::detect(recognizer, synthesizer)
}
