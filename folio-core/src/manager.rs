//! Chat session manager: owns the transcript, sequences user and model turns,
//! mirrors the transcript into storage and decides when replies are spoken.
//!
//! Model requests run on a spawned task. The session is moved into the task
//! and handed back with the outcome, so at most one request exists per
//! session. The host applies outcomes with [`ChatSessionManager::process_events`]
//! or [`ChatSessionManager::next_event`].

use crate::error::{ChatError, ExportError};
use crate::export::{self, ExportFormat};
use crate::instruction::SystemInstruction;
use crate::message::{ChatMessage, Origin};
use crate::session::ModelSession;
use crate::storage::TranscriptStore;
use crate::transcript::Transcript;
use crate::voice::{NoVoice, VoicePort};
use chrono::{Local, NaiveDate};
use config::Profile;
use llm::ChatModel;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

/// Shown to the user when a model request fails.
pub const CONNECTION_ERROR: &str = "Sorry, I'm having trouble connecting. Please try again later.";

pub type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    /// The assistant reply was appended to the transcript.
    ReplyReceived(ChatMessage),
    /// The request failed and the user turn was rolled back.
    SendFailed { error: String },
    HistoryCleared,
}

struct InFlight {
    generation: u64,
    origin: Origin,
    message: ChatMessage,
    abort: AbortHandle,
}

/// Always delivered for a dispatched request, even when the request task
/// panicked or was aborted. `session` is lost in those cases.
struct Outcome {
    generation: u64,
    session: Option<ModelSession>,
    result: Result<String, ChatError>,
}

pub struct ChatSessionManager<V: VoicePort = NoVoice> {
    model: Arc<dyn ChatModel + Send + Sync>,
    profile: Profile,
    store: TranscriptStore,
    transcript: Transcript,
    session: Option<ModelSession>,
    clock: Clock,
    voice: V,
    in_flight: Option<InFlight>,
    /// A request abandoned by `clear()` whose outcome has not come back yet
    orphaned: bool,
    generation: u64,
    error: Option<String>,
    events: VecDeque<ManagerEvent>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl ChatSessionManager<NoVoice> {
    /// Restore the stored transcript (or start from the greeting) and open a
    /// model session for today.
    pub fn new(
        model: Arc<dyn ChatModel + Send + Sync>,
        profile: Profile,
        store: TranscriptStore,
    ) -> Result<Self, ChatError> {
        Self::with_voice(model, profile, store, NoVoice)
    }
}

impl<V: VoicePort> ChatSessionManager<V> {
    pub fn with_voice(
        model: Arc<dyn ChatModel + Send + Sync>,
        profile: Profile,
        store: TranscriptStore,
        voice: V,
    ) -> Result<Self, ChatError> {
        let greeting = profile.greeting();
        let transcript = store
            .load(&greeting)
            .unwrap_or_else(|| Transcript::new(greeting));
        let clock: Clock = Box::new(|| Local::now().date_naive());
        let instruction = SystemInstruction::build(&profile, clock())?;
        let session = ModelSession::new(Arc::clone(&model), &instruction, &transcript);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        info!(
            model = model.name(),
            messages = transcript.len(),
            voice = voice.is_supported(),
            "Chat session manager ready"
        );

        Ok(Self {
            model,
            profile,
            store,
            transcript,
            session: Some(session),
            clock,
            voice,
            in_flight: None,
            orphaned: false,
            generation: 0,
            error: None,
            events: VecDeque::new(),
            outcome_tx,
            outcome_rx,
        })
    }

    /// Replace the date source. The session is rebuilt on the next send if
    /// its instruction no longer matches the clock.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn is_pristine(&self) -> bool {
        self.transcript.is_pristine()
    }

    /// True from dispatch until the outcome is applied, including the
    /// outcome of a request abandoned by `clear()`.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.orphaned
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    pub fn voice_mut(&mut self) -> &mut V {
        &mut self.voice
    }

    /// Example prompts, offered only while the transcript is pristine.
    pub fn example_prompts(&self) -> &[String] {
        if self.transcript.is_pristine() {
            &self.profile.example_prompts
        } else {
            &[]
        }
    }

    /// Append the user turn and dispatch the request.
    ///
    /// Returns false without touching anything when the text is blank, a
    /// request is already in flight or no session is available.
    pub fn send_message(&mut self, text: &str, origin: Origin) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        if self.is_busy() {
            debug!("Ignoring send while a request is in flight");
            return false;
        }
        self.refresh_session();
        let Some(mut session) = self.session.take() else {
            warn!("No model session available, dropping message");
            return false;
        };

        let message = ChatMessage::user(text);
        self.transcript.push(message.clone());
        self.persist();
        self.error = None;
        self.voice.cancel_speech();
        self.voice.observe(&message);

        let generation = self.generation;
        let text = text.to_string();
        let request = tokio::spawn(async move {
            let result = session.send(&text).await;
            (session, result)
        });
        let abort = request.abort_handle();

        // supervise the request so an outcome arrives whatever happens to it
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let (session, result) = match request.await {
                Ok((session, result)) => (Some(session), result),
                Err(e) if e.is_cancelled() => {
                    (None, Err(ChatError::Transport("request was canceled".to_string())))
                }
                Err(e) => {
                    error!(error = %e, "Model request task failed");
                    (None, Err(ChatError::Transport(format!("request task failed: {e}"))))
                }
            };
            let _ = tx.send(Outcome {
                generation,
                session,
                result,
            });
        });

        self.in_flight = Some(InFlight {
            generation,
            origin,
            message,
            abort,
        });
        debug!(?origin, generation, "Dispatching message");
        true
    }

    /// Send example prompt `index` as if it had been typed.
    pub fn send_example(&mut self, index: usize) -> bool {
        let Some(prompt) = self.example_prompts().get(index).cloned() else {
            return false;
        };
        self.send_message(&prompt, Origin::Prompt)
    }

    /// Submit a finished voice utterance, if the voice port has one.
    pub fn poll_voice(&mut self) -> bool {
        match self.voice.poll() {
            Some(text) => self.send_message(&text, Origin::Voice),
            None => false,
        }
    }

    /// Apply every outcome that has arrived, without waiting.
    pub fn process_events(&mut self) -> Vec<ManagerEvent> {
        let mut events: Vec<ManagerEvent> = self.events.drain(..).collect();
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if let Some(event) = self.apply(outcome) {
                events.push(event);
            }
        }
        events
    }

    /// Wait for the next event. Returns `None` when nothing is pending and
    /// no request is in flight.
    pub async fn next_event(&mut self) -> Option<ManagerEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        while self.is_busy() {
            let outcome = self.outcome_rx.recv().await?;
            if let Some(event) = self.apply(outcome) {
                return Some(event);
            }
        }
        None
    }

    fn apply(&mut self, outcome: Outcome) -> Option<ManagerEvent> {
        if outcome.generation != self.generation {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                "Discarding reply for a cleared conversation"
            );
            self.orphaned = false;
            return None;
        }
        let in_flight = self.in_flight.take()?;

        let event = match outcome.result {
            Ok(text) => {
                let reply = ChatMessage::assistant(text);
                self.transcript.push(reply.clone());
                self.persist();
                if in_flight.origin == Origin::Voice {
                    self.voice.arm();
                }
                self.voice.observe(&reply);
                Some(ManagerEvent::ReplyReceived(reply))
            }
            Err(e) => {
                error!(error = %e, "Model request failed");
                self.transcript.rollback(&in_flight.message);
                self.persist();
                self.error = Some(CONNECTION_ERROR.to_string());
                Some(ManagerEvent::SendFailed {
                    error: e.to_string(),
                })
            }
        };
        // a panicked request loses its session; rebuild it from the transcript
        self.session = outcome.session.or_else(|| self.build_session());
        event
    }

    /// Back to the greeting: store cleared, speech canceled, fresh session.
    /// A request still in flight is aborted; the manager stays busy until its
    /// outcome comes back and is discarded.
    pub fn clear(&mut self) {
        self.generation += 1;
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.abort.abort();
            self.orphaned = true;
        }
        self.error = None;
        self.transcript.reset();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored history");
        }
        self.voice.disarm();
        self.voice.cancel_speech();
        self.session = self.build_session();
        info!(generation = self.generation, "Conversation cleared");
        self.events.push_back(ManagerEvent::HistoryCleared);
    }

    /// Whether a stop control for the current utterance should be offered.
    pub fn can_stop_speaking(&self) -> bool {
        self.transcript.last().is_assistant() && self.voice.is_speaking()
    }

    pub fn stop_speaking(&mut self) {
        self.voice.cancel_speech();
    }

    /// The assistant view is going away: stop listening and speaking. A
    /// request in flight keeps running.
    pub fn close(&mut self) {
        self.voice.shutdown();
    }

    /// Write the conversation, minus the greeting, to a PDF in `dir`.
    pub async fn export_transcript(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        self.export_transcript_as(dir, ExportFormat::Pdf).await
    }

    pub async fn export_transcript_as(
        &self,
        dir: &Path,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        if self.transcript.is_pristine() {
            return Err(ExportError::Empty);
        }
        let today = (self.clock)();
        let path = dir.join(export::export_file_name(
            &self.profile.owner_name,
            today,
            format,
        ));
        let title = format!(
            "Conversation with {}'s {} - {}",
            self.profile.owner_name,
            self.profile.assistant_label,
            today.format("%B %-d, %Y")
        );
        let turns = self.transcript.conversation().to_vec();
        let label = self.profile.assistant_label.clone();
        let dir = dir.to_path_buf();

        let written = tokio::task::spawn_blocking(move || -> Result<PathBuf, ExportError> {
            let bytes = match format {
                ExportFormat::Pdf => export::render_pdf(&title, &turns, &label)?,
                ExportFormat::Html => export::render_html_page(&title, &turns, &label)?.into_bytes(),
            };
            std::fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
                path: dir.clone(),
                source,
            })?;
            std::fs::write(&path, bytes).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            Ok(path)
        })
        .await
        .map_err(|e| ExportError::Task(e.to_string()))??;

        info!(path = %written.display(), "Exported transcript");
        Ok(written)
    }

    fn refresh_session(&mut self) {
        let today = (self.clock)();
        let stale = self
            .session
            .as_ref()
            .is_some_and(|s| s.instruction_date() != today);
        if stale {
            info!(%today, "Date changed, rebuilding model session");
            self.session = self.build_session();
        }
    }

    fn build_session(&self) -> Option<ModelSession> {
        match SystemInstruction::build(&self.profile, (self.clock)()) {
            Ok(instruction) => Some(ModelSession::new(
                Arc::clone(&self.model),
                &instruction,
                &self.transcript,
            )),
            Err(e) => {
                error!(error = %e, "Failed to build system instruction");
                None
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.transcript) {
            warn!(error = %e, "Failed to persist chat history");
        }
    }
}
