use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};
use url::Url;

use crate::error::CompletionError;
use crate::parameters::RequestParameters;
use crate::prompt_template::RenderedPrompt;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Sampling temperatures the provider itself accepts.
const PROVIDER_TEMPERATURE_MAX: f32 = 2.0;

/// Sends a rendered prompt to a chat-completion provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        params: &RequestParameters,
    ) -> Result<String, CompletionError>;
}

pub struct OpenAiClient {
    endpoint: Url,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &Url) -> Result<Self> {
        let endpoint = base_url
            .join("chat/completions")
            .wrap_err_with(|| format!("invalid completion base url: {}", base_url))?;

        Ok(Self {
            endpoint,
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        params: &RequestParameters,
    ) -> Result<String, CompletionError> {
        let credential = params
            .credential()
            .ok_or_else(|| CompletionError::AuthFailure("no API key supplied".to_string()))?;

        let request_body = build_request_body(prompt, params)?;

        debug!(
            model = %params.model(),
            temperature = params.temperature(),
            max_tokens = params.max_tokens(),
            "Sending chat completion request to {}",
            self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(credential.expose())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| CompletionError::ProviderError(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                CompletionError::ProviderError(format!("failed to read response: {}", e))
            })?;

        if !status.is_success() {
            error!("Completion request failed with status {}", status);
            return Err(classify_failure(status, &body));
        }

        debug!("Received completion response ({} bytes)", body.len());
        extract_content(&body)
    }
}

/// Builds the JSON body after checking the provider's own parameter limits.
fn build_request_body(
    prompt: &RenderedPrompt,
    params: &RequestParameters,
) -> Result<Value, CompletionError> {
    let temperature = params.temperature();
    if !(0.0..=PROVIDER_TEMPERATURE_MAX).contains(&temperature) {
        return Err(CompletionError::InvalidParameters(format!(
            "temperature {} outside 0.0..={}",
            temperature, PROVIDER_TEMPERATURE_MAX
        )));
    }
    if params.max_tokens() == 0 {
        return Err(CompletionError::InvalidParameters(
            "max_tokens must be positive".to_string(),
        ));
    }

    Ok(json!({
        "model": params.model().as_str(),
        "messages": prompt.messages(),
        "temperature": temperature,
        "max_tokens": params.max_tokens(),
    }))
}

fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    let message = provider_message(body).unwrap_or_else(|| format!("HTTP {}", status));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::AuthFailure(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            CompletionError::InvalidParameters(message)
        }
        _ => CompletionError::ProviderError(message),
    }
}

/// Pulls `error.message` out of an OpenAI-style error body.
fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn extract_content(body: &str) -> Result<String, CompletionError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::ProviderError(format!("malformed response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::ProviderError("response contained no message".to_string()))
}
