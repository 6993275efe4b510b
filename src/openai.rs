//! OpenAI-compatible answer judge
//!
//! Talks to any `/v1/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::PipelineError;
use crate::oracle::{build_judge_prompt, parse_verdict, AnswerOracle, JUDGE_TEMPERATURE, TRIVIA_JUDGE_SYSTEM_PROMPT};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiJudge {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiJudge {
    pub fn new(api_key: String, model: impl Into<String>) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn complete(&self, text: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(PipelineError::OracleNotConfigured(
                "OPENAI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = build_request(&self.model, text);

        debug!(model = %self.model, "Calling OpenAI judge");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI request failed: {}", e);
                PipelineError::OracleError(format!("OpenAI API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI error response ({}): {}", status, error_text);
            return Err(PipelineError::OracleError(format!(
                "OpenAI API error {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            error!("Failed to parse OpenAI response: {}", e);
            PipelineError::OracleError(format!("OpenAI parse error: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::OracleError("Empty response from OpenAI".to_string()))
    }
}

#[async_trait]
impl AnswerOracle for OpenAiJudge {
    fn name(&self) -> &str {
        "openai"
    }

    async fn judge(&self, text: &str) -> crate::Result<bool> {
        let reply = self.complete(text).await?;
        parse_verdict(&reply)
    }
}

fn build_request(model: &str, text: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        temperature: JUDGE_TEMPERATURE,
        max_tokens: 5,
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: Some(TRIVIA_JUDGE_SYSTEM_PROMPT.to_string()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: Some(build_judge_prompt(text)),
            },
        ],
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}
