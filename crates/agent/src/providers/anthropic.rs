use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::endpoint;
use crate::llm::{non_empty, post_json, GenerationOptions, LlmClient, LlmError};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(http: Client, api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self { http, api_key, base_url: base_url.to_string(), model: model.to_string() }
    }

    fn request_body<'a>(&'a self, prompt: &'a str, options: GenerationOptions) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![Message { role: "user", content: prompt }],
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str, options: GenerationOptions) -> Result<String, LlmError> {
        let request = self
            .http
            .post(endpoint(&self.base_url, "v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION);
        let response: MessagesResponse =
            post_json(request, &self.request_body(prompt, options)).await?;
        message_text(response)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

fn message_text(response: MessagesResponse) -> Result<String, LlmError> {
    non_empty(response.content.into_iter().find_map(|block| block.text))
}
