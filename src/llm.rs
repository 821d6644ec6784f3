use crate::config::GenerationConfig;
use crate::types::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A text completion backend. The pipeline only ever talks to this trait,
/// so tests substitute a mock and never touch the network.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn name(&self) -> String;

    /// Issue one completion call and return the raw response text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(client: Client, api_key: String, config: &GenerationConfig) -> Self {
        Self {
            client,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn name(&self) -> String {
        format!("anthropic ({})", self.model)
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Calling model '{}' ({} prompt chars)", self.model, prompt.len());

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Model(format!("API {}: {}", status, body)));
        }

        let parsed: MessagesResponse = response.json().await?;
        let text = parsed
            .content
            .iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text.clone())
            .ok_or_else(|| PipelineError::Model("no text content in response".to_string()))?;

        Ok(text)
    }
}

/// Mock client for tests and dry runs: returns canned responses in
/// rotation, falling back to the last one once exhausted.
pub struct MockModelClient {
    responses: Vec<String>,
    calls: std::sync::Mutex<usize>,
}

impl MockModelClient {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            calls: std::sync::Mutex::new(0),
        }
    }

    /// A mock that always answers with one fixed response.
    pub fn fixed(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("call counter")
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    fn name(&self) -> String {
        "mock".to_string()
    }

    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        let mut calls = self.calls.lock().expect("call counter");
        let index = (*calls).min(self.responses.len().saturating_sub(1));
        *calls += 1;
        self.responses
            .get(index)
            .cloned()
            .ok_or_else(|| PipelineError::Model("mock has no responses".to_string()))
    }
}
