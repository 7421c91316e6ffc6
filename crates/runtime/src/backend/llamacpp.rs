//! llama.cpp server backend.

use crate::llm::{Backend, GenerateRequest, ModelError};
use protocol::Template;
use serde::{Deserialize, Serialize};

const DEFAULT_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: String,
    n_predict: u32,
    temperature: f32,
    min_p: f32,
    repeat_penalty: f32,
    stop: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

/// Builder for creating a llama.cpp backend.
#[derive(Debug, Clone)]
pub struct LlamaCppBackendBuilder {
    url: String,
    max_tokens: u32,
    temperature: f32,
    template: Template,
}

impl LlamaCppBackendBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_tokens: 512,
            temperature: 0.3,
            template: Template::default(),
        }
    }

    /// Set the maximum tokens to generate.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Chat template used to render the prompt.
    pub fn template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// Build the backend.
    pub fn build(self) -> LlamaCppBackend {
        LlamaCppBackend {
            client: reqwest::Client::new(),
            url: self.url.trim_end_matches('/').to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            template: self.template,
        }
    }
}

impl Default for LlamaCppBackendBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

/// A model served by `llama-server`, driven through its raw `/completion`
/// endpoint so the chat template and its sentinels stay under our control.
///
/// The server must be started with `--special`. Without it, sentinel tokens
/// such as `<|tool_call_start|>` are dropped from the generated text and no
/// reply will ever contain a tool call.
pub struct LlamaCppBackend {
    client: reqwest::Client,
    url: String,
    max_tokens: u32,
    temperature: f32,
    template: Template,
}

impl LlamaCppBackend {
    /// Create a builder for the llama.cpp backend.
    pub fn builder(url: impl Into<String>) -> LlamaCppBackendBuilder {
        LlamaCppBackendBuilder::new(url)
    }

    /// Render the conversation with the chat template, ending on an open
    /// assistant turn.
    pub fn render_prompt(&self, request: &GenerateRequest<'_>) -> String {
        let t = &self.template;
        let mut prompt = t.begin_of_text.clone();
        if let Some(system) = request.system {
            prompt.push_str(&t.turn("system", system));
        }
        for message in request.messages {
            prompt.push_str(&t.turn(message.role.as_str(), &message.content));
        }
        prompt.push_str(&t.assistant_header());
        prompt
    }
}

impl std::fmt::Display for LlamaCppBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "llama.cpp({})", self.url)
    }
}

impl Backend for LlamaCppBackend {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, ModelError> {
        let body = CompletionRequest {
            prompt: self.render_prompt(&request),
            n_predict: self.max_tokens,
            temperature: self.temperature,
            min_p: 0.15,
            repeat_penalty: 1.05,
            stop: [self.template.turn_end.as_str()],
        };

        let response = self
            .client
            .post(format!("{}/completion", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ModelError::Unavailable(e.to_string())
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {text}")));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
        Ok(completion.content)
    }
}
