use eyre::{Result, WrapErr};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::error::TranscriptionError;
use crate::parameters::Credential;

pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for an OpenAI-compatible `/audio/transcriptions` endpoint.
pub struct WhisperClient {
    endpoint: Url,
    model: String,
    client: reqwest::Client,
}

impl WhisperClient {
    pub fn new(base_url: &Url, model: impl Into<String>) -> Result<Self> {
        let endpoint = base_url
            .join("audio/transcriptions")
            .wrap_err_with(|| format!("invalid transcription base url: {}", base_url))?;

        Ok(Self {
            endpoint,
            model: model.into(),
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn transcribe(
        &self,
        wav: Vec<u8>,
        credential: Option<&Credential>,
    ) -> Result<String, TranscriptionError> {
        let credential = credential.ok_or_else(|| {
            TranscriptionError::ServiceUnavailable(
                "no API key configured for speech recognition".to_string(),
            )
        })?;

        let file = Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| TranscriptionError::ServiceUnavailable(e.to_string()))?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", file);

        debug!("Sending utterance to {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(credential.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                TranscriptionError::ServiceUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::ServiceUnavailable(e.to_string()))?;

        if !status.is_success() {
            error!("Transcription request failed with status {}", status);
            return Err(classify_failure(status));
        }

        parse_transcript(&body)
    }
}

fn classify_failure(status: StatusCode) -> TranscriptionError {
    match status {
        // The service rejects audio it cannot decode with a 400.
        StatusCode::BAD_REQUEST => TranscriptionError::UnintelligibleAudio,
        _ => TranscriptionError::ServiceUnavailable(format!("HTTP {}", status)),
    }
}

fn parse_transcript(body: &str) -> Result<String, TranscriptionError> {
    let response: TranscriptionResponse = serde_json::from_str(body).map_err(|e| {
        TranscriptionError::ServiceUnavailable(format!("malformed response: {}", e))
    })?;

    let text = response.text.trim();
    if text.is_empty() {
        return Err(TranscriptionError::UnintelligibleAudio);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let base = Url::parse("https://api.openai.com/v1/").unwrap();
        let client = WhisperClient::new(&base, DEFAULT_TRANSCRIPTION_MODEL).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_parse_transcript() {
        assert_eq!(
            parse_transcript(r#"{"text":"  What is 2+2? "}"#).unwrap(),
            "What is 2+2?"
        );
        assert_eq!(
            parse_transcript(r#"{"text":""}"#),
            Err(TranscriptionError::UnintelligibleAudio)
        );
        assert!(matches!(
            parse_transcript("oops"),
            Err(TranscriptionError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST),
            TranscriptionError::UnintelligibleAudio
        );
        assert!(matches!(
            classify_failure(StatusCode::UNAUTHORIZED),
            TranscriptionError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY),
            TranscriptionError::ServiceUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_is_service_unavailable() {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let client = WhisperClient::new(&base, DEFAULT_TRANSCRIPTION_MODEL).unwrap();
        let result = client.transcribe(vec![0u8; 128], None).await;
        assert!(matches!(result, Err(TranscriptionError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_service_unavailable() {
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let client = WhisperClient::new(&base, DEFAULT_TRANSCRIPTION_MODEL).unwrap();
        let credential = Credential::new("sk-test");
        let result = client.transcribe(vec![0u8; 128], credential.as_ref()).await;
        assert!(matches!(result, Err(TranscriptionError::ServiceUnavailable(_))));
    }
}
