//! Gemini client for natural-language-to-code generation.
//!
//! Wraps the `generateContent` REST endpoint. The model is instructed to
//! emit a Python workflow body against the Daemon SDK contract; the reply
//! is returned as opaque code text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CodeGenerator;

/// Instructions prepended to every generation request.
///
/// The SDK functions named here are implemented by the execution worker;
/// the backend only needs the generated code to call them by name.
const CODEGEN_INSTRUCTIONS: &str = "\
You write Python workflow bodies for the Daemon platform. The runtime \
provides exactly three functions:

  get_trigger_data() -> dict   # incoming webhook payload
  get_secret(name: str) -> str # stored credential value
  post_slack_message(token: str, channel: str, text: str) -> dict

Write only the workflow body. No imports, no function definitions, no \
markdown fences, no commentary.

Task: ";

/// Gemini code generator
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiGenerator {
    /// Create a generator for a specific model
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment variables (DAEMON_GEMINI_API_KEY)
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("DAEMON_GEMINI_API_KEY")
            .context("DAEMON_GEMINI_API_KEY environment variable required")?;
        Ok(Self::new(api_key, model))
    }
}

#[async_trait]
impl CodeGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{CODEGEN_INSTRUCTIONS}{prompt}"),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("Invalid Gemini response body")?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .context("Gemini response contained no candidates")?;

        Ok(strip_code_fences(text).to_string())
    }
}

/// Remove a surrounding markdown code fence, if the model added one anyway
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop an optional language tag on the opening fence line
    match inner.split_once('\n') {
        Some((tag, body)) if tag.chars().all(|c| c.is_ascii_alphanumeric()) => body.trim(),
        _ => inner.trim(),
    }
}
