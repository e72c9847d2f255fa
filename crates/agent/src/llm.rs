use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use camquote_core::errors::ExtractorError;

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<LlmError> for ExtractorError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::Transport(message) => Self::Transport(message),
            LlmError::Timeout => Self::Timeout,
            LlmError::Status { status, body } => Self::Status { status, body },
            LlmError::EmptyResponse => Self::Provider("provider returned no text".to_string()),
            LlmError::Decode(message) => Self::Provider(message),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends one user prompt and returns the model's raw text reply.
    async fn complete(&self, prompt: &str, options: GenerationOptions) -> Result<String, LlmError>;
}

/// Posts `body` and decodes a successful reply as `T`. Non-2xx replies become
/// [`LlmError::Status`] carrying a truncated copy of the response body.
pub(crate) async fn post_json<B, T>(request: RequestBuilder, body: &B) -> Result<T, LlmError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = request.json(body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    response.json::<T>().await.map_err(|error| LlmError::Decode(error.to_string()))
}

/// Trims a reply and rejects it when nothing is left.
pub(crate) fn non_empty(text: Option<String>) -> Result<String, LlmError> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(LlmError::EmptyResponse)
}
