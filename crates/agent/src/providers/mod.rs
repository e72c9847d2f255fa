pub mod anthropic;
pub mod gemini;
pub mod openai_compat;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai_compat::ChatCompletionsClient;

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::endpoint;

    #[test]
    fn endpoint_joins_without_doubled_slashes() {
        assert_eq!(
            endpoint("https://api.groq.com/openai/v1/", "/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(endpoint("http://localhost:8080", "v1/messages"), "http://localhost:8080/v1/messages");
    }
}
