//! Traffic logging for LLM API calls
//!
//! Emits request/response summaries under the `llm::traffic` target.
//! Content is truncated to avoid leaking private data in logs.

/// Maximum characters to log for content
const MAX_CONTENT_LOG_CHARS: usize = 200;

/// Truncate a string for logging, adding ellipsis if truncated
pub(crate) fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars total)", truncated, char_count)
    }
}

fn summarize(value: &impl serde::Serialize) -> String {
    let json =
        serde_json::to_string(value).unwrap_or_else(|_| "<serialization error>".to_string());
    truncate_for_log(&json, MAX_CONTENT_LOG_CHARS)
}

pub fn log_request(model: &str, request: &impl serde::Serialize) {
    tracing::debug!(target: "llm::traffic", model, summary = %summarize(request), "REQUEST");
}

pub fn log_response(model: &str, response: &impl serde::Serialize) {
    tracing::debug!(target: "llm::traffic", model, summary = %summarize(response), "RESPONSE");
}

pub fn log_error(model: &str, error: &str) {
    tracing::warn!(target: "llm::traffic", model, error, "ERROR");
}
