//! Chat completion client for answer synthesis.
//!
//! [`CompletionClient`] is the seam to the remote completion model; the
//! OpenAI implementation posts a single user message and returns the
//! first choice's content. No retry: a failed call surfaces to the
//! caller wrapped with a human-readable prefix.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::credentials::Credential;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Single-prompt text completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Completion client backed by the OpenAI chat completions API.
///
/// Responses are capped at `max_answer_tokens` output tokens. Requests
/// carry the `OpenAI-Project` header when the credential is
/// project-scoped, mirroring the embedding client.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
    credential: Credential,
}

impl OpenAiCompletion {
    pub fn new(config: &OpenAiConfig, credential: Credential) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build completions HTTP client")?;

        Ok(Self {
            client,
            model: config.chat_model.clone(),
            max_tokens: config.max_answer_tokens,
            credential,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.credential.api_key.trim()),
            )
            .header("Content-Type", "application/json");

        if let Some(ref project) = self.credential.project_id {
            request = request.header("OpenAI-Project", project);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .context("completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!(
                "completion request failed: API error {}: {}",
                status,
                body_text
            );
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("completion request failed: unreadable response")?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("completion request failed: no choices returned"))?;

        Ok(answer)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
