//! Gemini-backed answer judge
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use reqwest::Client;
use std::time::Duration;
use async_trait::async_trait;
use crate::error::PipelineError;
use crate::oracle::{build_judge_prompt, parse_verdict, AnswerOracle, JUDGE_TEMPERATURE, TRIVIA_JUDGE_SYSTEM_PROMPT};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiJudge {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiJudge {
    pub fn new(api_key: String, model: &str) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/{}:generateContent", GEMINI_BASE_URL, model),
        })
    }

    async fn generate(&self, text: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(PipelineError::OracleNotConfigured(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let request = build_request(text);

        debug!("Calling Gemini judge");

        // Key goes in a header, never in the URL
        let response = self.client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini request failed: {}", e);
                PipelineError::OracleError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini error response ({}): {}", status, error_text);
            return Err(PipelineError::OracleError(
                format!("Gemini API error {}: {}", status, error_text)
            ));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            PipelineError::OracleError(format!("Gemini parse error: {}", e))
        })?;

        extract_text(gemini_response)
    }
}

#[async_trait]
impl AnswerOracle for GeminiJudge {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn judge(&self, text: &str) -> crate::Result<bool> {
        let reply = self.generate(text).await?;
        parse_verdict(&reply)
    }
}

fn build_request(text: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: build_judge_prompt(text),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: JUDGE_TEMPERATURE,
            top_p: 0.9,
            top_k: 1,
            max_output_tokens: 5,
        },
        system_instruction: SystemInstruction {
            parts: vec![Part {
                text: TRIVIA_JUDGE_SYSTEM_PROMPT.to_string(),
            }],
        },
    }
}

fn extract_text(response: GeminiResponse) -> crate::Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| PipelineError::OracleError("Empty response from Gemini".to_string()))
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
