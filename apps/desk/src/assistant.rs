//! # Narrative Assistant
//!
//! Hands the ranked result summary to an external text service and keeps
//! the chat transcript.
//!
//! ## Conversation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  match results ──► render_summary(top 200) ──► ChatSession::new        │
//! │                                                     │                   │
//! │  user question ─────────────────────────────────────┤                   │
//! │                                                     ▼                   │
//! │                                    busy? ── yes ──► ChatError::Busy    │
//! │                                      │                                  │
//! │                                      no                                 │
//! │                                      ▼                                  │
//! │                         NarrativeAssistant::ask(summary, question)     │
//! │                                      │                                  │
//! │                      ┌───────────────┴───────────────┐                 │
//! │                      ▼                               ▼                  │
//! │               Ok(answer)                       Err(failure)             │
//! │           assistant message              one assistant message          │
//! │                                          "assistant unavailable: .."    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed round-trip never touches the computed results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::AssistantSettings;

// =============================================================================
// Errors
// =============================================================================

/// Failures talking to the assistant service.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("no assistant URL is configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned an empty answer")]
    EmptyReply,
}

/// Failures of the chat session itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("the assistant is still answering the previous question")]
    Busy,

    #[error("question is empty")]
    EmptyQuestion,
}

// =============================================================================
// Assistant Seam
// =============================================================================

/// Anything that can answer a question about a result summary.
#[async_trait]
pub trait NarrativeAssistant: Send + Sync {
    async fn ask(&self, summary: &str, question: &str) -> Result<String, AssistantError>;
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    summary: &'a str,
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    answer: String,
}

/// JSON-over-HTTP assistant.
///
/// Posts `{"summary": .., "question": ..}` and accepts either
/// `{"answer": ".."}` or a plain-text body.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpAssistant {
    pub fn new(settings: &AssistantSettings) -> Result<Self, AssistantError> {
        let url = settings
            .url
            .clone()
            .ok_or(AssistantError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(HttpAssistant {
            client,
            url,
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl NarrativeAssistant for HttpAssistant {
    async fn ask(&self, summary: &str, question: &str) -> Result<String, AssistantError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&AskRequest { summary, question });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(url = %self.url, summary_bytes = summary.len(), "asking assistant");
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_answer(&body)
    }
}

fn parse_answer(body: &str) -> Result<String, AssistantError> {
    let answer = match serde_json::from_str::<AskResponse>(body) {
        Ok(parsed) => parsed.answer,
        Err(_) => body.to_string(),
    };
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(AssistantError::EmptyReply);
    }
    Ok(answer.to_string())
}

// =============================================================================
// Chat Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

/// A conversation about one set of results.
pub struct ChatSession {
    assistant: Arc<dyn NarrativeAssistant>,
    summary: String,
    transcript: Mutex<Vec<ChatMessage>>,
    busy: AtomicBool,
}

/// Clears the busy flag even if the request future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatSession {
    pub fn new(assistant: Arc<dyn NarrativeAssistant>, summary: String) -> Self {
        ChatSession {
            assistant,
            summary,
            transcript: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Asks one question and returns the assistant's message.
    ///
    /// A service failure is not an error here: it becomes the assistant's
    /// message for this turn.
    ///
    /// ## Errors
    /// - `ChatError::Busy` while another question is outstanding
    /// - `ChatError::EmptyQuestion` for blank input
    pub async fn ask(&self, question: &str) -> Result<ChatMessage, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(ChatError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        self.push(ChatMessage {
            speaker: Speaker::User,
            text: question.to_string(),
        });

        let text = match self.assistant.ask(&self.summary, question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "assistant request failed");
                format!("The assistant is unavailable right now ({}).", e)
            }
        };

        let reply = ChatMessage {
            speaker: Speaker::Assistant,
            text,
        };
        self.push(reply.clone());
        Ok(reply)
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, message: ChatMessage) {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
