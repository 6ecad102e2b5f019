//! LLM annotation of Markdown documents
//!
//! [`ChatAnnotator`] talks to an OpenAI-compatible chat-completion endpoint.
//! Callers normally go through [`annotate_or_fallback`], which never fails:
//! any error is folded into a locally generated annotation so every input
//! still produces an output document.

use crate::config::AiConfig;
use crate::error::{AnnotateError, ConfigError, FetchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Env var holding the bearer token for the chat endpoint
pub const API_KEY_ENV: &str = "ANNOTATOR_API_KEY";

/// Env var holding the chat endpoint base URL (e.g. `https://api.openai.com/v1`)
pub const API_BASE_ENV: &str = "ANNOTATOR_API_BASE";

/// Prefix of the user message sent with every document
const USER_PROMPT_PREFIX: &str = "Please analyze the following article:\n\n";

/// Error text kept in the fallback summary line
const FALLBACK_SUMMARY_CHARS: usize = 100;

/// Produces an annotation block for a document
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Annotate the full document text
    async fn annotate(&self, content: &str) -> Result<String, AnnotateError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completion backed annotator
#[derive(Clone)]
pub struct ChatAnnotator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    ai: AiConfig,
    system_prompt: String,
}

impl ChatAnnotator {
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        ai: AiConfig,
        system_prompt: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(crate::DEFAULT_USER_AGENT)
            .build()
            .map_err(FetchError::ClientBuildError)?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            ai,
            system_prompt: system_prompt.into(),
        })
    }

    /// Build from [`API_KEY_ENV`] and [`API_BASE_ENV`]
    pub fn from_env(ai: AiConfig, system_prompt: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = read_env(API_KEY_ENV)?;
        let api_base = read_env(API_BASE_ENV)?;
        Self::new(&api_base, api_key, ai, system_prompt)
            .map_err(|e| ConfigError::Invalid(format!("cannot build API client: {e}")))
    }

    /// Full URL the requests go to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn read_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name)),
    }
}

#[async_trait]
impl Annotator for ChatAnnotator {
    async fn annotate(&self, content: &str) -> Result<String, AnnotateError> {
        let user_message = format!("{USER_PROMPT_PREFIX}{content}");
        let request = ChatRequest {
            model: &self.ai.model,
            temperature: self.ai.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
        };

        debug!(endpoint = %self.endpoint, model = %self.ai.model, "Requesting annotation");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            }
            .into());
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or(AnnotateError::EmptyResponse)?;
        let text = choice
            .message
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(AnnotateError::EmptyMessage);
        }
        Ok(text)
    }
}

/// Locally generated annotation used when the model call fails
pub fn fallback_annotation(content: &str, error: &str, date: &str) -> String {
    let short: String = error.chars().take(FALLBACK_SUMMARY_CHARS).collect();
    format!(
        "## Annotation\n\
         - Date: {date}\n\
         - Category: uncategorized\n\
         - Tags: pending-review\n\
         - Relevance: low\n\
         - Summary: Automatic annotation failed: {short}\n\
         - Content length: {length} characters\n\
         - Error detail: {error}",
        length = content.chars().count(),
    )
}

/// Annotate `content`, substituting the fallback on any error
///
/// Returns the annotation and whether it came from the model.
pub async fn annotate_or_fallback(annotator: &dyn Annotator, content: &str) -> (String, bool) {
    match annotator.annotate(content).await {
        Ok(annotation) => (annotation, true),
        Err(e) => {
            warn!(error = %e, "Annotation failed, using fallback");
            let today = chrono::Local::now().format("%Y-%m-%d").to_string();
            (fallback_annotation(content, &e.to_string(), &today), false)
        }
    }
}
