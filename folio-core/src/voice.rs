//! The manager's view of speech input and output.
//!
//! The manager drives a `VoicePort` from its own turn sequence: it polls for
//! finished utterances, reports every message appended to the transcript
//! and arms playback after a voice-originated reply. Implementations live
//! outside this crate.

use crate::message::ChatMessage;

pub trait VoicePort {
    /// Whether both recognition and synthesis are available. When false all
    /// voice controls are inert.
    fn is_supported(&self) -> bool {
        false
    }

    fn is_listening(&self) -> bool {
        false
    }

    fn is_speaking(&self) -> bool {
        false
    }

    /// A final utterance ready to be submitted, at most once per utterance.
    fn poll(&mut self) -> Option<String> {
        None
    }

    /// Speak the next assistant message. Single use.
    fn arm(&mut self) {}

    fn disarm(&mut self) {}

    /// Called for every message appended to the transcript.
    fn observe(&mut self, _message: &ChatMessage) {}

    fn cancel_speech(&mut self) {}

    /// Stop recognition and cancel synthesis.
    fn shutdown(&mut self) {}
}

/// Voice disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVoice;

impl VoicePort for NoVoice {}
