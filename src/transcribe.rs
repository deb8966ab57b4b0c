use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chat::client::api_url;
use crate::config::TranscriptionConfig;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Transcription service not configured. Please set TOGETHER_API_KEY.")]
    NotConfigured,

    #[error("Failed to read audio file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid transcription timeout '{0}'")]
    InvalidTimeout(String),

    #[error("Transcription error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcription error: service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No speech recognised in {0}")]
    Empty(PathBuf),
}

/// Turns recorded speech into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionError>;
}

/// Whisper transcription on Together AI
pub struct TogetherTranscriber {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    language: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl TogetherTranscriber {
    pub fn new(config: &TranscriptionConfig, api_key: String) -> Result<Self, TranscriptionError> {
        if api_key.trim().is_empty() {
            return Err(TranscriptionError::NotConfigured);
        }

        let timeout = humantime::parse_duration(&config.timeout)
            .map_err(|_| TranscriptionError::InvalidTimeout(config.timeout.clone()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key,
            endpoint: api_url(&config.base_url, "audio/transcriptions"),
            model: config.model.clone(),
            language: config.language.clone(),
        })
    }
}

/// Upload name and MIME type for an audio file, guessed from its extension
fn audio_part_meta(path: &Path) -> (String, &'static str) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());

    let mime = match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    };

    (file_name, mime)
}

#[async_trait]
impl Transcriber for TogetherTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|source| TranscriptionError::Read {
                path: audio.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %audio.display(), bytes = bytes.len(), "uploading audio");

        let (file_name, mime) = audio_part_meta(audio);
        let part = Part::bytes(bytes).file_name(file_name).mime_str(mime)?;

        let mut form = Form::new().text("model", self.model.clone()).part("file", part);
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let transcript: TranscriptionResponse = response.json().await?;
        let text = transcript.text.trim().to_string();
        if text.is_empty() {
            return Err(TranscriptionError::Empty(audio.to_path_buf()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_part_meta() {
        assert_eq!(
            audio_part_meta(Path::new("/tmp/question.MP3")),
            ("question.MP3".to_string(), "audio/mpeg")
        );
        assert_eq!(
            audio_part_meta(Path::new("clip.wav")),
            ("clip.wav".to_string(), "audio/wav")
        );
        assert_eq!(
            audio_part_meta(Path::new("noext")).1,
            "application/octet-stream"
        );
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            TogetherTranscriber::new(&TranscriptionConfig::default(), String::new()),
            Err(TranscriptionError::NotConfigured)
        ));
    }

    #[test]
    fn test_response_parsing() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"text": " What is karma? ", "task": "transcribe"}"#).unwrap();
        assert_eq!(parsed.text.trim(), "What is karma?");
    }
}
