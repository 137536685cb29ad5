use anyhow::{Result, anyhow};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::traits::{SpeechRecognizer, SpeechSynthesizer};
use crate::types::{RecognitionEvent, SynthesisEvent};

pub struct UnsupportedRecognizer;

impl UnsupportedRecognizer {
    pub fn new() -> Result<Self> {
        Err(anyhow!("Speech recognition is not available (no recognizer command configured)"))
    }
}

impl SpeechRecognizer for UnsupportedRecognizer {
    fn start(&mut self) -> Result<UnboundedReceiver<RecognitionEvent>> {
        Err(anyhow!("Speech recognition is not available"))
    }

    fn stop(&mut self) {}

    fn abort(&mut self) {}
}

pub struct UnsupportedSynthesizer;

impl UnsupportedSynthesizer {
    pub fn new() -> Result<Self> {
        Err(anyhow!("Speech synthesis is not available (no synthesizer command configured)"))
    }
}

impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn speak(&mut self, _text: &str) -> Result<UnboundedReceiver<SynthesisEvent>> {
        Err(anyhow!("Speech synthesis is not available"))
    }

    fn cancel(&mut self) {}
}
