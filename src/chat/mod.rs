pub mod client;
pub mod prompt;

pub use client::{ChatClient, TogetherChat};
pub use prompt::{build_messages, find_tradition, reference_context, system_prompt};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::quiz::QuizConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat service not configured. Please set TOGETHER_API_KEY.")]
    NotConfigured,

    #[error("Message and tradition required")]
    MissingInput,

    #[error("Tradition not found: {0}")]
    UnknownTradition(String),

    #[error("Invalid chat timeout '{0}'")]
    InvalidTimeout(String),

    #[error("Chat error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat error: service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Chat error: empty response")]
    EmptyResponse,
}

impl ChatError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ChatError::Http(e) => e.is_timeout() || e.is_connect(),
            ChatError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A chat about one tradition, keeping the exchanged messages.
pub struct Conversation {
    client: Arc<dyn ChatClient>,
    tradition: String,
    system_prompt: String,
    history: Vec<ChatMessage>,
    history_limit: usize,
}

impl Conversation {
    /// Start a conversation about a tradition given by key or display name.
    pub fn start(
        quiz: &QuizConfig,
        tradition: &str,
        client: Arc<dyn ChatClient>,
        history_limit: usize,
    ) -> Result<Self, ChatError> {
        if tradition.trim().is_empty() {
            return Err(ChatError::MissingInput);
        }
        let (key, descriptor) = find_tradition(quiz, tradition)
            .ok_or_else(|| ChatError::UnknownTradition(tradition.to_string()))?;
        tracing::debug!(tradition = key, "starting conversation");

        Ok(Self {
            client,
            tradition: descriptor.name.clone(),
            system_prompt: system_prompt(descriptor),
            history: Vec::new(),
            history_limit,
        })
    }

    /// Display name of the tradition being discussed
    pub fn tradition(&self) -> &str {
        &self.tradition
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send a message and record the exchange. A failed request leaves the history unchanged.
    pub async fn send(&mut self, message: &str) -> Result<String, ChatError> {
        let messages = build_messages(
            &self.system_prompt,
            &self.history,
            message,
            self.history_limit,
        )?;
        let reply = self.client.complete(&messages).await?;

        self.history.push(ChatMessage::user(message.trim()));
        self.history.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }
}
