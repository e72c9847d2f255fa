use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::endpoint;
use crate::llm::{non_empty, post_json, GenerationOptions, LlmClient, LlmError};

pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: Client, api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self { http, api_key, base_url: base_url.to_string(), model: model.to_string() }
    }

    fn url(&self) -> String {
        endpoint(&self.base_url, &format!("v1beta/models/{}:generateContent", self.model))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str, options: GenerationOptions) -> Result<String, LlmError> {
        let request =
            self.http.post(self.url()).header("x-goog-api-key", self.api_key.expose_secret());
        let response: GenerateResponse = post_json(request, &request_body(prompt, options)).await?;
        candidate_text(response)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn request_body(prompt: &str, options: GenerationOptions) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content { parts: vec![Part { text: prompt }] }],
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
        },
    }
}

// A candidate may split its answer over several parts.
fn candidate_text(response: GenerateResponse) -> Result<String, LlmError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect::<String>());
    non_empty(text)
}
