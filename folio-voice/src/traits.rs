use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::{RecognitionEvent, SynthesisEvent};

/// Speech-to-text for a single utterance with interim results
pub trait SpeechRecognizer: Send {
    /// Begin listening and return the channel of recognition events
    fn start(&mut self) -> Result<UnboundedReceiver<RecognitionEvent>>;

    /// Stop listening; an `End` event follows
    fn stop(&mut self);

    /// Stop listening and discard whatever was heard
    fn abort(&mut self);
}

/// Text-to-speech
pub trait SpeechSynthesizer: Send {
    /// Start speaking `text`, replacing any utterance in progress
    fn speak(&mut self, text: &str) -> Result<UnboundedReceiver<SynthesisEvent>>;

    /// Silence the current utterance
    fn cancel(&mut self);
}
