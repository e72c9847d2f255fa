use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::endpoint;
use crate::llm::{non_empty, post_json, GenerationOptions, LlmClient, LlmError};

/// Client for the `/chat/completions` protocol spoken by both Groq and OpenAI.
pub struct ChatCompletionsClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    system_message: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(http: Client, api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.to_string(),
            model: model.to_string(),
            system_message: None,
        }
    }

    /// Sends `message` as a system turn ahead of every prompt.
    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.system_message = Some(message.into());
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str, options: GenerationOptions) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_message {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: prompt });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, prompt: &str, options: GenerationOptions) -> Result<String, LlmError> {
        let request = self
            .http
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(self.api_key.expose_secret());
        let response: ChatResponse = post_json(request, &self.request_body(prompt, options)).await?;
        completion_text(response)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
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
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn completion_text(response: ChatResponse) -> Result<String, LlmError> {
    non_empty(response.choices.into_iter().next().and_then(|choice| choice.message.content))
}
