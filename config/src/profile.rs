//! Static profile content the assistant answers questions about.
//!
//! The profile is loaded from a TOML file; a large context document can live in
//! a separate file referenced by `context_document_path` (relative paths are
//! resolved against the profile file's directory).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub owner_name: String,
    /// Label used for assistant turns in exports and the chat header
    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,
    /// Opening assistant message; derived from the owner name when absent
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub context_document: String,
    #[serde(default)]
    pub context_document_path: Option<PathBuf>,
    /// Role start dates used to compute experience durations
    #[serde(default)]
    pub roles: Vec<RoleStart>,
    #[serde(default)]
    pub example_prompts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleStart {
    pub title: String,
    pub company: String,
    pub started: NaiveDate,
    #[serde(default)]
    pub intern: bool,
}

fn default_assistant_label() -> String {
    "AI Career Assistant".to_string()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            owner_name: "the site owner".to_string(),
            assistant_label: default_assistant_label(),
            greeting: None,
            context_document: String::new(),
            context_document_path: None,
            roles: Vec::new(),
            example_prompts: vec![
                "Summarize resume.".to_string(),
                "What are your strongest backend skills?".to_string(),
            ],
        }
    }
}

impl Profile {
    /// Load a profile file, inlining the referenced context document if any
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read profile {}: {}", path.display(), e))?;
        let mut profile: Profile =
            toml::from_str(&content).map_err(|e| format!("Invalid profile: {}", e))?;

        if let Some(doc_path) = profile.context_document_path.clone() {
            let doc_path = match path.parent() {
                Some(parent) if doc_path.is_relative() => parent.join(doc_path),
                _ => doc_path,
            };
            profile.context_document = fs::read_to_string(&doc_path).map_err(|e| {
                format!("Failed to read context document {}: {}", doc_path.display(), e)
            })?;
        }

        Ok(profile)
    }

    pub fn greeting(&self) -> String {
        match &self.greeting {
            Some(greeting) => greeting.clone(),
            None => format!(
                "Hello! I'm {}'s AI assistant. You can ask me anything about their experience, projects, or skills. How can I help?",
                self.owner_name
            ),
        }
    }
}
