use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::{ChatError, ChatMessage};
use crate::config::ChatConfig;

/// Produces an assistant reply for a prepared list of messages.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// OpenAI-compatible chat completions on Together AI
pub struct TogetherChat {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Join an API base URL and an endpoint path
pub(crate) fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Parse a humantime duration such as "30s" or "1m 30s"
pub(crate) fn parse_timeout(value: &str) -> Result<Duration, ChatError> {
    humantime::parse_duration(value).map_err(|_| ChatError::InvalidTimeout(value.to_string()))
}

impl TogetherChat {
    pub fn new(config: &ChatConfig, api_key: String) -> Result<Self, ChatError> {
        if api_key.trim().is_empty() {
            return Err(ChatError::NotConfigured);
        }

        let http = reqwest::Client::builder()
            .timeout(parse_timeout(&config.timeout)?)
            .build()?;

        Ok(Self {
            http,
            api_key,
            endpoint: api_url(&config.base_url, "chat/completions"),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    async fn request(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ChatError::EmptyResponse)
    }
}

#[async_trait]
impl ChatClient for TogetherChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        // Up to 3 retries after the first attempt, only for transient failures
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        tracing::debug!(model = %self.model, messages = messages.len(), "requesting chat completion");

        RetryIf::spawn(
            retry_strategy,
            || self.request(messages),
            |e: &ChatError| {
                let retry = e.is_transient();
                if retry {
                    tracing::warn!(error = %e, "chat request failed, retrying");
                }
                retry
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_timeout("1m 30s").unwrap(), Duration::from_secs(90));
        assert!(matches!(
            parse_timeout("soon"),
            Err(ChatError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_missing_key_not_configured() {
        assert!(matches!(
            TogetherChat::new(&ChatConfig::default(), "  ".to_string()),
            Err(ChatError::NotConfigured)
        ));
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        assert_eq!(
            api_url("http://localhost:8080/v1/", "chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            api_url("https://api.together.xyz/v1", "audio/transcriptions"),
            "https://api.together.xyz/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = CompletionRequest {
            model: "m",
            messages: &messages,
            max_tokens: 80,
            temperature: 0.5,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 80);
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": " Hello "}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some(" Hello ")
        );
    }
}
