use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use folio_core::{ChatSessionManager, ExportError, ExportFormat, ManagerEvent, Origin};
use folio_voice::VoiceCoordinator;
use std::path::PathBuf;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

const HELP: &str = "/ask N send example prompt N  /voice talk  /stop silence  /export [html] save transcript  /clear reset  /quit";

/// Input history for up/down arrow navigation
struct InputHistory {
    entries: Vec<String>,
    position: Option<usize>,
    draft: String,
}

impl InputHistory {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            position: None,
            draft: String::new(),
        }
    }

    fn push(&mut self, entry: String) {
        if !entry.is_empty() && self.entries.last() != Some(&entry) {
            self.entries.push(entry);
        }
        self.position = None;
        self.draft.clear();
    }

    fn prev(&mut self, current_input: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        match self.position {
            None => {
                self.draft = current_input.to_string();
                self.position = Some(self.entries.len() - 1);
            }
            Some(pos) if pos > 0 => self.position = Some(pos - 1),
            _ => return None,
        }
        self.position.map(|p| self.entries[p].as_str())
    }

    fn next(&mut self) -> Option<&str> {
        let pos = self.position?;
        if pos + 1 < self.entries.len() {
            self.position = Some(pos + 1);
            Some(self.entries[pos + 1].as_str())
        } else {
            self.position = None;
            Some(self.draft.as_str())
        }
    }
}

pub struct App {
    pub manager: ChatSessionManager<VoiceCoordinator>,
    pub input: Input,
    pub notice: Option<String>,
    pub scroll_offset: usize,
    thinking_frame: usize,
    history: InputHistory,
    export_dir: PathBuf,
}

impl App {
    pub fn new(manager: ChatSessionManager<VoiceCoordinator>, export_dir: PathBuf) -> Self {
        Self {
            manager,
            input: Input::default(),
            notice: None,
            scroll_offset: 0,
            thinking_frame: 0,
            history: InputHistory::new(),
            export_dir,
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn thinking_indicator(&self) -> &'static str {
        const BRAILLE_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];
        BRAILLE_FRAMES[self.thinking_frame % BRAILLE_FRAMES.len()]
    }

    /// One turn of the event loop: apply finished requests, submit finished
    /// utterances and surface voice errors.
    pub fn tick(&mut self) {
        for event in self.manager.process_events() {
            match event {
                ManagerEvent::ReplyReceived(_) => self.scroll_offset = 0,
                ManagerEvent::SendFailed { error } => {
                    tracing::error!("TUI: send failed: {}", error);
                }
                ManagerEvent::HistoryCleared => {
                    self.notice = Some("Conversation cleared".to_string());
                }
            }
        }

        if self.manager.poll_voice() {
            self.scroll_offset = 0;
        }
        if let Some(err) = self.manager.voice_mut().take_error() {
            tracing::warn!("TUI: voice error: {}", err);
            self.notice = Some(format!("Voice error: {}", err));
        }

        if self.manager.is_busy() || self.manager.voice().is_listening() {
            self.thinking_frame = self.thinking_frame.wrapping_add(1);
        }
    }

    /// Handle a key event - returns false if should quit
    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Result<bool> {
        if key.kind != KeyEventKind::Press {
            return Ok(true);
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                return Ok(false);
            }
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::F(2), _) => self.toggle_voice(),
            (KeyCode::Up, _) => {
                if let Some(entry) = self.history.prev(self.input.value()) {
                    self.input = Input::from(entry.to_string());
                }
            }
            (KeyCode::Down, _) => {
                if let Some(entry) = self.history.next() {
                    self.input = Input::from(entry.to_string());
                }
            }
            (KeyCode::PageUp, _) => self.scroll_up(10),
            (KeyCode::PageDown, _) => self.scroll_down(10),
            (KeyCode::Enter, _) => {
                let line = self.input.value().trim().to_string();
                if line.is_empty() {
                    return Ok(true);
                }
                self.notice = None;
                if let Some(command) = line.strip_prefix('/') {
                    self.history.push(line.clone());
                    self.input.reset();
                    return self.handle_command(command).await;
                }
                // a rejected message stays in the input box
                if self.send(&line, Origin::Typed) {
                    self.history.push(line);
                    self.input.reset();
                }
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
            }
        }
        Ok(true)
    }

    /// Handle a slash command - returns false if should quit
    async fn handle_command(&mut self, command: &str) -> Result<bool> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        match name {
            "quit" | "exit" | "q" => return Ok(false),
            "help" | "h" => self.notice = Some(HELP.to_string()),
            "clear" => self.manager.clear(),
            "stop" => self.manager.stop_speaking(),
            "voice" => self.toggle_voice(),
            "export" => match parts.next() {
                None | Some("pdf") => self.export(ExportFormat::Pdf).await,
                Some("html") => self.export(ExportFormat::Html).await,
                Some(other) => self.notice = Some(format!("Unknown export format: {}", other)),
            },
            "ask" => {
                let index = parts.next().and_then(|n| n.parse::<usize>().ok());
                match index {
                    Some(n) if n >= 1 && n <= self.manager.example_prompts().len() => {
                        if self.manager.send_example(n - 1) {
                            self.scroll_offset = 0;
                        } else {
                            self.notice = Some("Still waiting for the last reply".to_string());
                        }
                    }
                    _ if self.manager.example_prompts().is_empty() => {
                        self.notice = Some("Example prompts are only offered before the first message".to_string());
                    }
                    _ => {
                        self.notice = Some(format!(
                            "Usage: /ask 1..{}",
                            self.manager.example_prompts().len()
                        ));
                    }
                }
            }
            other => self.notice = Some(format!("Unknown command: /{}", other)),
        }
        Ok(true)
    }

    fn send(&mut self, text: &str, origin: Origin) -> bool {
        let accepted = self.manager.send_message(text, origin);
        if accepted {
            self.scroll_offset = 0;
        } else if self.manager.is_busy() {
            self.notice = Some("Still waiting for the last reply".to_string());
        }
        accepted
    }

    fn escape(&mut self) {
        if self.manager.can_stop_speaking() {
            self.manager.stop_speaking();
        } else if self.manager.voice().is_listening() {
            self.manager.voice_mut().stop_listening();
        } else {
            self.manager.dismiss_error();
            self.notice = None;
        }
    }

    fn toggle_voice(&mut self) {
        if self.manager.is_busy() && !self.manager.voice().is_listening() {
            self.notice = Some("Wait for the reply before speaking".to_string());
            return;
        }
        if let Err(e) = self.manager.voice_mut().toggle_listening() {
            self.notice = Some(e.to_string());
        }
    }

    async fn export(&mut self, format: ExportFormat) {
        self.notice = Some(match self.manager.export_transcript_as(&self.export_dir, format).await {
            Ok(path) => format!("Saved {}", path.display()),
            Err(ExportError::Empty) => "Nothing to export yet".to_string(),
            Err(e) => {
                tracing::error!("TUI: export failed: {}", e);
                format!("Export failed: {}", e)
            }
        });
    }

    /// Stop listening and speaking before the terminal goes away
    pub fn close(&mut self) {
        self.manager.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use config::Profile;
    use folio_core::{MemoryStore, TranscriptStore};
    use llm::{ChatModel, ChatRequest};
    use std::sync::Arc;

    /// Never answers, so the first message keeps the manager busy
    struct SilentModel;

    #[async_trait]
    impl ChatModel for SilentModel {
        fn name(&self) -> &str {
            "silent"
        }

        async fn chat(&self, _request: &ChatRequest) -> anyhow::Result<llm::ChatMessage> {
            std::future::pending().await
        }
    }

    fn app() -> App {
        let manager = ChatSessionManager::with_voice(
            Arc::new(SilentModel),
            Profile::default(),
            TranscriptStore::new(MemoryStore::new()),
            VoiceCoordinator::unsupported(),
        )
        .unwrap();
        App::new(manager, std::env::temp_dir())
    }

    fn enter() -> KeyEvent {
        KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
    }

    #[test]
    fn test_history_navigation_restores_draft() {
        let mut history = InputHistory::new();
        history.push("first".into());
        history.push("second".into());
        history.push("second".into());

        assert_eq!(history.prev("typing"), Some("second"));
        assert_eq!(history.prev("typing"), Some("first"));
        assert_eq!(history.prev("typing"), None);
        assert_eq!(history.next(), Some("second"));
        assert_eq!(history.next(), Some("typing"));
        assert_eq!(history.next(), None);
    }

    #[tokio::test]
    async fn test_message_typed_while_busy_stays_in_the_input() {
        let mut app = app();
        app.input = Input::from("first".to_string());
        assert!(app.handle_key_event(enter()).await.unwrap());
        assert_eq!(app.input.value(), "");
        assert!(app.manager.is_busy());

        app.input = Input::from("second".to_string());
        assert!(app.handle_key_event(enter()).await.unwrap());
        assert_eq!(app.input.value(), "second");
        assert_eq!(app.notice.as_deref(), Some("Still waiting for the last reply"));
        assert_eq!(app.manager.messages().len(), 2);

        // only the accepted message is recalled from history
        assert_eq!(app.history.prev(""), Some("first"));
        assert_eq!(app.history.prev(""), None);
    }
}
