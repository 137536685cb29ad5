//! Application settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Application settings stored in settings.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Model name passed to the provider (e.g. "gemini-2.5-flash")
    pub model: Option<String>,
    /// Override for the Gemini endpoint; GEMINI_BASE_URL wins over this
    pub api_base_url: Option<String>,
    /// Profile the assistant speaks for; defaults to profile.toml in the config dir
    pub profile_path: Option<PathBuf>,
    /// Where transcript exports are written
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub voice: VoiceSettings,
}

/// External commands backing speech I/O. Either missing means voice is unsupported.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VoiceSettings {
    /// Speech-to-text command, e.g. ["folio-stt", "--lang", "en"].
    /// Its stdout must emit `partial: <text>` / `final: <text>` lines.
    pub recognizer_command: Option<Vec<String>>,
    /// Text-to-speech command; the utterance is appended as the last argument.
    pub synthesizer_command: Option<Vec<String>>,
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        match PathManager::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from an explicit path; unreadable or invalid files yield defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };

        toml::from_str(&content).unwrap_or_default()
    }

    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn profile_path(&self) -> Option<PathBuf> {
        self.profile_path.clone().or_else(PathManager::profile_path)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(PathManager::export_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
