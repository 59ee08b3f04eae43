//! Subtask suggestions from the Gemini `generateContent` API, with canned
//! fallbacks when no key is configured or the call fails.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Returned without any network call when no API key is available
pub const NO_KEY_FALLBACK: [&str; 5] = [
    "Scripting",
    "Filming",
    "Editing",
    "Thumbnail Design",
    "Publishing",
];

/// Returned when the service call fails
pub const ERROR_FALLBACK: [&str; 7] = [
    "Research & Outline",
    "Draft Script",
    "Record Video",
    "Edit Footage",
    "Create Thumbnail",
    "Write Description & Tags",
    "Publish",
];

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Could not decode suggestions: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Service returned no suggestions")]
    Empty,
}

/// Connection settings for the suggestion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Result of a generation request. `tasks` is never empty; when `error` is
/// set the tasks are the error fallback and the caller should tell the user.
#[derive(Debug)]
pub struct Suggestions {
    pub tasks: Vec<String>,
    pub error: Option<SuggestError>,
}

impl Suggestions {
    fn canned(list: &[&str], error: Option<SuggestError>) -> Self {
        Self {
            tasks: list.iter().map(|s| s.to_string()).collect(),
            error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub struct SubtaskSuggester {
    config: SuggestConfig,
}

impl SubtaskSuggester {
    pub fn new(config: SuggestConfig) -> Self {
        Self { config }
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Suggest 5 to 8 subtasks for a project. Never fails: a missing key
    /// yields `NO_KEY_FALLBACK`, any error yields `ERROR_FALLBACK`.
    pub fn generate(&self, title: &str, description: &str) -> Suggestions {
        let Some(key) = self.api_key() else {
            tracing::warn!("no API key configured, using default subtasks");
            return Suggestions::canned(&NO_KEY_FALLBACK, None);
        };

        match self.request(key, title, description) {
            Ok(tasks) => {
                tracing::info!(count = tasks.len(), model = %self.config.model, "subtasks generated");
                Suggestions { tasks, error: None }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to generate subtasks");
                Suggestions::canned(&ERROR_FALLBACK, Some(e))
            }
        }
    }

    fn request(&self, key: &str, title: &str, description: &str) -> Result<Vec<String>, SuggestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;

        let response = client
            .post(self.url())
            .header("x-goog-api-key", key)
            .json(&request_body(title, description))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(SuggestError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_tasks(&response.text()?)
    }
}

fn prompt(title: &str, description: &str) -> String {
    format!(
        "I am a content creator and teacher. I have a project titled \"{title}\" described as \
         \"{description}\". Please generate a list of 5 to 8 concrete, actionable subtasks \
         (steps) to complete this video or teaching project. Return ONLY the list of tasks as \
         strings."
    )
}

fn request_body(title: &str, description: &str) -> serde_json::Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt(title, description) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": { "type": "ARRAY", "items": { "type": "STRING" } }
        }
    })
}

/// Pull the JSON string array out of a `generateContent` response body
fn parse_tasks(body: &str) -> Result<Vec<String>, SuggestError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(SuggestError::Empty);
    }

    let tasks: Vec<String> = serde_json::from_str::<Vec<String>>(&text)?
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if tasks.is_empty() {
        Err(SuggestError::Empty)
    } else {
        Ok(tasks)
    }
}

/// Projects with a suggestion request in flight
#[derive(Debug, Default)]
pub struct GeneratingSet {
    projects: HashSet<String>,
}

impl GeneratingSet {
    /// Mark `project_id` as generating; `false` if it already was
    pub fn begin(&mut self, project_id: &str) -> bool {
        self.projects.insert(project_id.to_string())
    }

    pub fn finish(&mut self, project_id: &str) {
        self.projects.remove(project_id);
    }

    pub fn is_generating(&self, project_id: &str) -> bool {
        self.projects.contains(project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggester(key: Option<&str>, endpoint: &str) -> SubtaskSuggester {
        SubtaskSuggester::new(SuggestConfig {
            api_key: key.map(str::to_string),
            endpoint: endpoint.to_string(),
            timeout_secs: 2,
            ..Default::default()
        })
    }

    #[test]
    fn missing_key_returns_default_list() {
        for key in [None, Some(""), Some("   ")] {
            let result = suggester(key, DEFAULT_ENDPOINT).generate("Fractions video", "intro");
            assert_eq!(result.tasks, NO_KEY_FALLBACK);
            assert!(result.error.is_none());
        }
    }

    #[test]
    fn unreachable_service_returns_error_list() {
        let result = suggester(Some("key"), "http://127.0.0.1:9").generate("Course", "");
        assert_eq!(result.tasks, ERROR_FALLBACK);
        assert!(matches!(result.error, Some(SuggestError::Http(_))));
    }

    #[test]
    fn parses_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[\"Outline\", \" Record \", \"\"]"}]}}]}"#;
        assert_eq!(parse_tasks(body).unwrap(), vec!["Outline", "Record"]);
    }

    #[test]
    fn empty_or_malformed_text_is_an_error() {
        assert!(matches!(parse_tasks(r#"{"candidates":[]}"#), Err(SuggestError::Empty)));
        let not_array = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}]}"#;
        assert!(matches!(parse_tasks(not_array), Err(SuggestError::Decode(_))));
    }

    #[test]
    fn url_targets_configured_model() {
        let s = suggester(Some("k"), "https://example.test/v1beta/");
        assert_eq!(
            s.url(),
            "https://example.test/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn request_asks_for_string_array() {
        let body = request_body("Title", "Desc");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"Title\"") && text.contains("\"Desc\""));
    }

    #[test]
    fn generating_marker_refuses_duplicates() {
        let mut set = GeneratingSet::default();
        assert!(set.begin("p1"));
        assert!(!set.begin("p1"));
        assert!(set.begin("p2"));
        set.finish("p1");
        assert!(!set.is_generating("p1"));
        assert!(set.is_generating("p2"));
        assert!(set.begin("p1"));
    }
}
