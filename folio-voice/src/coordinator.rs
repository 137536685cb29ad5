use crate::error::VoiceError;
use crate::traits::{SpeechRecognizer, SpeechSynthesizer};
use crate::types::{RecognitionEvent, SynthesisEvent};
use folio_core::{ChatMessage, VoicePort, plain_text};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

/// Drives speech recognition and synthesis for the chat manager.
///
/// `listening` and `speaking` follow the backend events, never the calls
/// made here: a session is listening until its `End`/`Error` arrives (or
/// its channel closes) and an utterance is speaking from `Started` until
/// `Ended`/`Error` or an explicit cancel.
pub struct VoiceCoordinator {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    recognition_rx: Option<UnboundedReceiver<RecognitionEvent>>,
    synthesis_rx: Option<UnboundedReceiver<SynthesisEvent>>,
    listening: bool,
    speaking: bool,
    armed: bool,
    draft: String,
    submitted: bool,
    error: Option<String>,
}

impl VoiceCoordinator {
    pub fn new(
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Self {
        Self::with_backends(Some(recognizer), Some(synthesizer))
    }

    /// Coordinator with every control inert
    pub fn unsupported() -> Self {
        Self::with_backends(None, None)
    }

    /// Feature detection: voice is supported only when both backends could
    /// be constructed.
    pub fn detect(
        recognizer: anyhow::Result<Box<dyn SpeechRecognizer>>,
        synthesizer: anyhow::Result<Box<dyn SpeechSynthesizer>>,
    ) -> Self {
        match (recognizer, synthesizer) {
            (Ok(recognizer), Ok(synthesizer)) => {
                info!("Voice input and output available");
                Self::new(recognizer, synthesizer)
            }
            (recognizer, synthesizer) => {
                if let Err(e) = recognizer {
                    info!("Voice disabled: {}", e);
                }
                if let Err(e) = synthesizer {
                    info!("Voice disabled: {}", e);
                }
                Self::unsupported()
            }
        }
    }

    fn with_backends(
        recognizer: Option<Box<dyn SpeechRecognizer>>,
        synthesizer: Option<Box<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            recognizer,
            synthesizer,
            recognition_rx: None,
            synthesis_rx: None,
            listening: false,
            speaking: false,
            armed: false,
            draft: String::new(),
            submitted: false,
            error: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some() && self.synthesizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Live interim transcript of the current utterance
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Most recent backend error, reported once
    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    /// Start a single-utterance recognition session. Anything being spoken is
    /// silenced first.
    pub fn start_listening(&mut self) -> Result<(), VoiceError> {
        if !self.is_supported() {
            return Err(VoiceError::Unsupported);
        }
        if self.listening {
            return Ok(());
        }
        self.stop_speaking();

        let Some(recognizer) = self.recognizer.as_mut() else {
            return Err(VoiceError::Unsupported);
        };
        let rx = recognizer
            .start()
            .map_err(|e| VoiceError::Recognition(e.to_string()))?;
        self.recognition_rx = Some(rx);
        self.listening = true;
        self.submitted = false;
        self.draft.clear();
        debug!("Listening");
        Ok(())
    }

    /// Ask the recognizer to finish; the session ends when its `End` arrives.
    pub fn stop_listening(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
    }

    pub fn toggle_listening(&mut self) -> Result<(), VoiceError> {
        if self.listening {
            self.stop_listening();
            Ok(())
        } else {
            self.start_listening()
        }
    }

    pub fn stop_speaking(&mut self) {
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            if self.speaking || self.synthesis_rx.is_some() {
                synthesizer.cancel();
            }
        }
        self.synthesis_rx = None;
        self.speaking = false;
    }

    /// Drain backend events. Returns the final transcript to submit, at most
    /// once per recognition session.
    pub fn process(&mut self) -> Option<String> {
        self.drain_synthesis();
        self.drain_recognition()
    }

    fn drain_recognition(&mut self) -> Option<String> {
        let mut submit = None;
        loop {
            let Some(rx) = self.recognition_rx.as_mut() else {
                break;
            };
            let event = match rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => RecognitionEvent::End,
            };
            match event {
                RecognitionEvent::Interim(text) => {
                    if !self.submitted {
                        self.draft = text;
                    }
                }
                RecognitionEvent::Final(text) => {
                    let text = text.trim();
                    if !self.submitted && !text.is_empty() {
                        debug!(chars = text.len(), "Final transcript");
                        self.submitted = true;
                        self.draft.clear();
                        submit = Some(text.to_string());
                    }
                }
                RecognitionEvent::Error(e) => {
                    warn!("Speech recognition error: {}", e);
                    self.error = Some(e);
                    self.end_recognition();
                }
                RecognitionEvent::End => self.end_recognition(),
            }
        }
        submit
    }

    fn end_recognition(&mut self) {
        self.recognition_rx = None;
        self.listening = false;
        self.draft.clear();
    }

    fn drain_synthesis(&mut self) {
        loop {
            let Some(rx) = self.synthesis_rx.as_mut() else {
                break;
            };
            match rx.try_recv() {
                Ok(SynthesisEvent::Started) => self.speaking = true,
                Ok(SynthesisEvent::Ended) | Err(TryRecvError::Disconnected) => {
                    self.speaking = false;
                    self.synthesis_rx = None;
                }
                Ok(SynthesisEvent::Error(e)) => {
                    warn!("Speech synthesis error: {}", e);
                    self.error = Some(e);
                    self.speaking = false;
                    self.synthesis_rx = None;
                }
                Err(TryRecvError::Empty) => break,
            }
        }
    }

    fn speak(&mut self, text: &str) {
        self.stop_speaking();
        let Some(synthesizer) = self.synthesizer.as_mut() else {
            return;
        };
        match synthesizer.speak(text) {
            Ok(rx) => {
                self.synthesis_rx = Some(rx);
                self.drain_synthesis();
            }
            Err(e) => {
                warn!("Failed to speak reply: {}", e);
                self.error = Some(VoiceError::Synthesis(e.to_string()).to_string());
            }
        }
    }
}

impl VoicePort for VoiceCoordinator {
    fn is_supported(&self) -> bool {
        VoiceCoordinator::is_supported(self)
    }

    fn is_listening(&self) -> bool {
        self.listening
    }

    fn is_speaking(&self) -> bool {
        self.speaking
    }

    fn poll(&mut self) -> Option<String> {
        self.process()
    }

    fn arm(&mut self) {
        if self.is_supported() {
            self.armed = true;
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn observe(&mut self, message: &ChatMessage) {
        if !std::mem::take(&mut self.armed) {
            return;
        }
        if message.is_assistant() {
            self.speak(&plain_text(message.text()));
        }
    }

    fn cancel_speech(&mut self) {
        self.stop_speaking();
    }

    fn shutdown(&mut self) {
        if self.listening {
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.abort();
            }
        }
        self.end_recognition();
        self.armed = false;
        self.stop_speaking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc::{self, UnboundedSender};

    /// Recognizer whose event channel is driven by the test
    #[derive(Clone, Default)]
    struct ScriptedRecognizer {
        tx: Arc<Mutex<Option<UnboundedSender<RecognitionEvent>>>>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScriptedRecognizer {
        fn emit(&self, event: RecognitionEvent) {
            if let Some(tx) = self.tx.lock().unwrap().as_ref() {
                tx.send(event).unwrap();
            }
        }
    }

    impl SpeechRecognizer for ScriptedRecognizer {
        fn start(&mut self) -> anyhow::Result<UnboundedReceiver<RecognitionEvent>> {
            let (tx, rx) = mpsc::unbounded_channel();
            *self.tx.lock().unwrap() = Some(tx);
            self.calls.lock().unwrap().push("start");
            Ok(rx)
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop");
            self.emit(RecognitionEvent::End);
        }

        fn abort(&mut self) {
            self.calls.lock().unwrap().push("abort");
            *self.tx.lock().unwrap() = None;
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSynthesizer {
        spoken: Arc<Mutex<Vec<String>>>,
        cancels: Arc<Mutex<usize>>,
        tx: Arc<Mutex<Option<UnboundedSender<SynthesisEvent>>>>,
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn speak(&mut self, text: &str) -> anyhow::Result<UnboundedReceiver<SynthesisEvent>> {
            self.spoken.lock().unwrap().push(text.to_string());
            let (tx, rx) = mpsc::unbounded_channel();
            tx.send(SynthesisEvent::Started).unwrap();
            *self.tx.lock().unwrap() = Some(tx);
            Ok(rx)
        }

        fn cancel(&mut self) {
            *self.cancels.lock().unwrap() += 1;
            *self.tx.lock().unwrap() = None;
        }
    }

    fn coordinator() -> (VoiceCoordinator, ScriptedRecognizer, RecordingSynthesizer) {
        let recognizer = ScriptedRecognizer::default();
        let synthesizer = RecordingSynthesizer::default();
        let coordinator =
            VoiceCoordinator::new(Box::new(recognizer.clone()), Box::new(synthesizer.clone()));
        (coordinator, recognizer, synthesizer)
    }

    #[test]
    fn test_interim_updates_draft_and_final_submits_once() {
        let (mut voice, recognizer, _) = coordinator();
        voice.start_listening().unwrap();
        assert!(voice.is_listening());

        recognizer.emit(RecognitionEvent::Interim("what is".into()));
        assert_eq!(voice.process(), None);
        assert_eq!(voice.draft(), "what is");

        recognizer.emit(RecognitionEvent::Final("  what is Rust?  ".into()));
        recognizer.emit(RecognitionEvent::Final("what is Rust?".into()));
        assert_eq!(voice.process(), Some("what is Rust?".to_string()));
        assert_eq!(voice.draft(), "");

        recognizer.emit(RecognitionEvent::End);
        assert_eq!(voice.process(), None);
        assert!(!voice.is_listening());
    }

    #[test]
    fn test_blank_final_is_not_submitted() {
        let (mut voice, recognizer, _) = coordinator();
        voice.start_listening().unwrap();
        recognizer.emit(RecognitionEvent::Final("   ".into()));
        recognizer.emit(RecognitionEvent::End);
        assert_eq!(voice.process(), None);
        assert!(!voice.is_listening());
    }

    #[test]
    fn test_error_and_closed_channel_end_the_session() {
        let (mut voice, recognizer, _) = coordinator();
        voice.start_listening().unwrap();
        recognizer.emit(RecognitionEvent::Error("no-speech".into()));
        voice.process();
        assert!(!voice.is_listening());
        assert_eq!(voice.take_error().as_deref(), Some("no-speech"));
        assert_eq!(voice.take_error(), None);

        voice.start_listening().unwrap();
        *recognizer.tx.lock().unwrap() = None;
        voice.process();
        assert!(!voice.is_listening());
    }

    #[test]
    fn test_stop_waits_for_end_event() {
        let (mut voice, recognizer, _) = coordinator();
        voice.toggle_listening().unwrap();
        voice.toggle_listening().unwrap();
        assert!(voice.is_listening());
        voice.process();
        assert!(!voice.is_listening());
        assert_eq!(*recognizer.calls.lock().unwrap(), vec!["start", "stop"]);
    }

    #[test]
    fn test_armed_reply_is_spoken_as_plain_text() {
        let (mut voice, _, synthesizer) = coordinator();
        VoicePort::arm(&mut voice);
        voice.observe(&ChatMessage::assistant("See [my CV](https://x.test/cv)."));
        assert!(voice.is_speaking());
        assert!(!voice.is_armed());
        assert_eq!(
            *synthesizer.spoken.lock().unwrap(),
            vec!["See my CV (https://x.test/cv).".to_string()]
        );

        voice.observe(&ChatMessage::assistant("second"));
        assert_eq!(synthesizer.spoken.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_user_message_consumes_arming() {
        let (mut voice, _, synthesizer) = coordinator();
        VoicePort::arm(&mut voice);
        voice.observe(&ChatMessage::user("typed"));
        voice.observe(&ChatMessage::assistant("reply"));
        assert!(synthesizer.spoken.lock().unwrap().is_empty());
    }

    #[test]
    fn test_synthesis_end_and_cancel_return_to_idle() {
        let (mut voice, _, synthesizer) = coordinator();
        VoicePort::arm(&mut voice);
        voice.observe(&ChatMessage::assistant("one"));
        assert!(voice.is_speaking());

        if let Some(tx) = synthesizer.tx.lock().unwrap().as_ref() {
            tx.send(SynthesisEvent::Ended).unwrap();
        }
        voice.process();
        assert!(!voice.is_speaking());

        VoicePort::arm(&mut voice);
        voice.observe(&ChatMessage::assistant("two"));
        voice.cancel_speech();
        assert!(!voice.is_speaking());
        assert_eq!(*synthesizer.cancels.lock().unwrap(), 1);
    }

    #[test]
    fn test_shutdown_aborts_listening_and_speech() {
        let (mut voice, recognizer, synthesizer) = coordinator();
        voice.start_listening().unwrap();
        VoicePort::arm(&mut voice);
        voice.shutdown();
        assert!(!voice.is_listening());
        assert!(!voice.is_armed());
        assert!(recognizer.calls.lock().unwrap().contains(&"abort"));
        assert_eq!(*synthesizer.cancels.lock().unwrap(), 0);
    }

    #[test]
    fn test_unsupported_controls_are_inert() {
        let mut voice = VoiceCoordinator::detect(
            crate::UnsupportedRecognizer::new().map(|r| Box::new(r) as Box<dyn SpeechRecognizer>),
            Ok(Box::new(RecordingSynthesizer::default())),
        );
        assert!(!voice.is_supported());
        assert!(matches!(voice.start_listening(), Err(VoiceError::Unsupported)));
        VoicePort::arm(&mut voice);
        assert!(!voice.is_armed());
        assert_eq!(voice.process(), None);
    }
}
