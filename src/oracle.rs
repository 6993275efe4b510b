//! Fallback oracle
//!
//! The oracle is only consulted for transcripts the rule set cannot place.
//! Implementations wrap a remote LLM and reduce its reply to a boolean.

use crate::error::PipelineError;
use crate::Result;
use async_trait::async_trait;

pub const TRIVIA_JUDGE_SYSTEM_PROMPT: &str = r#"You judge whether a short spoken utterance is an answer to a trivia question.

Criteria:
- It is a statement, not a question
- It names something specific or factual
- It is concise
- It is not a game command (bank, next, stop, skip)

Reply with exactly one word: true or false."#;

/// Sampling temperature for every judge backend
pub const JUDGE_TEMPERATURE: f32 = 0.1;

/// Trait for the probabilistic answer judge
#[async_trait]
pub trait AnswerOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Is `text` a plausible trivia answer?
    async fn judge(&self, text: &str) -> Result<bool>;
}

/// User message embedding the transcript
pub fn build_judge_prompt(text: &str) -> String {
    format!(
        "Is this text likely to be a trivia answer? Text: \"{}\"",
        text.trim()
    )
}

/// Read a single-token verdict, case-insensitively
pub fn parse_verdict(reply: &str) -> Result<bool> {
    let token = reply
        .trim()
        .trim_matches(|c: char| c == '.' || c == '"' || c == '\'')
        .to_lowercase();

    match token.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(PipelineError::OracleReply(reply.to_string())),
    }
}

/// Stand-in used when no LLM provider is configured.
/// Every escalation fails, so ambiguous transcripts are rejected.
pub struct DisabledOracle;

#[async_trait]
impl AnswerOracle for DisabledOracle {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn judge(&self, _text: &str) -> Result<bool> {
        Err(PipelineError::OracleNotConfigured(
            "set GEMINI_API_KEY or OPENAI_API_KEY to enable the fallback oracle".to_string(),
        ))
    }
}
