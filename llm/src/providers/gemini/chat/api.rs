use serde::{Deserialize, Serialize};

use crate::ChatRequest;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl TryFrom<crate::api::Role> for Role {
    type Error = anyhow::Error;

    fn try_from(value: crate::api::Role) -> Result<Self, Self::Error> {
        match value {
            crate::api::Role::User => Ok(Role::User),
            crate::api::Role::Assistant => Ok(Role::Model),
            crate::api::Role::System => Err(anyhow::anyhow!(
                "Gemini does not support system messages directly."
            )),
        }
    }
}

impl From<Role> for crate::api::Role {
    fn from(value: Role) -> Self {
        match value {
            Role::User => crate::api::Role::User,
            Role::Model => crate::api::Role::Assistant,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) thought: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) text: Option<String>,

    #[serde(flatten)]
    pub(crate) extra: Option<serde_json::Value>,
}

impl Part {
    pub fn new_text(text: impl Into<String>) -> Self {
        Part {
            thought: None,
            text: Some(text.into()),
            extra: None,
        }
    }

    /// Answer text, skipping thinking summaries
    fn answer_text(&self) -> Option<&str> {
        if self.thought.unwrap_or(false) {
            return None;
        }
        self.text.as_deref()
    }
}

// Gemini representation of messages.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<Role>,
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

impl TryFrom<&crate::ChatMessage> for Content {
    type Error = anyhow::Error;

    fn try_from(msg: &crate::ChatMessage) -> Result<Self, Self::Error> {
        Ok(Content {
            role: Some(msg.role.try_into()?),
            parts: vec![Part::new_text(msg.get_text())],
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<serde_json::Value>,
}

impl GenerateContentRequest {
    pub fn new(contents: Vec<Content>, system_instruction: Option<Content>) -> Self {
        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: None,
        }
    }
}

impl TryFrom<&ChatRequest> for GenerateContentRequest {
    type Error = anyhow::Error;

    fn try_from(request: &ChatRequest) -> Result<Self, Self::Error> {
        // System messages travel in systemInstruction, everything else in contents.
        let system_instruction = request.system_text().map(|text| Content {
            role: None,
            parts: vec![Part::new_text(text)],
        });
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != crate::api::Role::System)
            .map(Content::try_from)
            .collect::<anyhow::Result<Vec<Content>>>()?;

        if contents.is_empty() {
            anyhow::bail!("Gemini requests need at least one user or model turn");
        }

        Ok(GenerateContentRequest::new(contents, system_instruction))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<Content>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) prompt_feedback: Option<serde_json::Value>,
}

impl TryFrom<GenerateContentResponse> for crate::ChatMessage {
    type Error = anyhow::Error;

    fn try_from(response: GenerateContentResponse) -> Result<Self, Self::Error> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            anyhow::bail!(
                "Gemini returned no candidates (feedback: {})",
                response
                    .prompt_feedback
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
        };

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        let content = candidate
            .content
            .ok_or_else(|| anyhow::anyhow!("Gemini candidate has no content ({finish_reason})"))?;

        let text: String = content.parts.iter().filter_map(Part::answer_text).collect();
        if text.trim().is_empty() {
            anyhow::bail!("Gemini reply contained no text ({finish_reason})");
        }

        let role = content.role.map(Into::into).unwrap_or_default();
        Ok(crate::ChatMessage::new(role, text))
    }
}
