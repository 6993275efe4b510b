//! Runtime configuration
//!
//! Everything comes from the environment (optionally seeded from `.env`).

use crate::error::PipelineError;
use crate::gemini::GeminiJudge;
use crate::oracle::{AnswerOracle, DisabledOracle};
use crate::openai::OpenAiJudge;
use crate::pipeline::DEFAULT_ORACLE_TIMEOUT;
use crate::session::DEFAULT_QUEUE_CAPACITY;
use crate::Result;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleProvider {
    Gemini,
    OpenAi,
    Disabled,
}

impl FromStr for OracleProvider {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(OracleProvider::Gemini),
            "openai" => Ok(OracleProvider::OpenAi),
            "none" | "disabled" | "off" => Ok(OracleProvider::Disabled),
            other => Err(PipelineError::ConfigError(format!(
                "unknown ORACLE_PROVIDER {:?} (expected gemini, openai or none)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub oracle_provider: OracleProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub oracle_timeout: Duration,
    pub port: u16,
    pub queue_capacity: usize,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    /// Build from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gemini_api_key = get("GEMINI_API_KEY");
        let openai_api_key = get("OPENAI_API_KEY");

        let oracle_provider = match get("ORACLE_PROVIDER") {
            Some(value) => value.parse()?,
            None if gemini_api_key.is_some() => OracleProvider::Gemini,
            None if openai_api_key.is_some() => OracleProvider::OpenAi,
            None => OracleProvider::Disabled,
        };

        let oracle_timeout = match get("ORACLE_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_number(&value, "ORACLE_TIMEOUT_SECS")?),
            None => DEFAULT_ORACLE_TIMEOUT,
        };

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(value) => parse_number(&value, "PORT")?,
            None => DEFAULT_PORT,
        };

        let queue_capacity = match get("SESSION_QUEUE_CAPACITY") {
            Some(value) => parse_number(&value, "SESSION_QUEUE_CAPACITY")?,
            None => DEFAULT_QUEUE_CAPACITY,
        };

        Ok(Self {
            oracle_provider,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_key,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL"),
            oracle_timeout,
            port,
            queue_capacity,
        })
    }

    /// Construct the configured fallback oracle
    pub fn build_oracle(&self) -> Result<Arc<dyn AnswerOracle>> {
        let oracle: Arc<dyn AnswerOracle> = match self.oracle_provider {
            OracleProvider::Gemini => {
                let key = self.gemini_api_key.clone().ok_or_else(|| {
                    PipelineError::ConfigError(
                        "ORACLE_PROVIDER=gemini requires GEMINI_API_KEY".to_string(),
                    )
                })?;
                Arc::new(GeminiJudge::new(key, &self.gemini_model)?)
            }
            OracleProvider::OpenAi => {
                let key = self.openai_api_key.clone().ok_or_else(|| {
                    PipelineError::ConfigError(
                        "ORACLE_PROVIDER=openai requires OPENAI_API_KEY".to_string(),
                    )
                })?;
                let judge = OpenAiJudge::new(key, self.openai_model.clone())?;
                match &self.openai_base_url {
                    Some(url) => Arc::new(judge.with_base_url(url.clone())),
                    None => Arc::new(judge),
                }
            }
            OracleProvider::Disabled => {
                warn!("No fallback oracle configured; ambiguous transcripts will be rejected");
                Arc::new(DisabledOracle)
            }
        };

        info!(oracle = oracle.name(), timeout = ?self.oracle_timeout, "Fallback oracle ready");
        Ok(oracle)
    }
}

fn parse_number<T: FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PipelineError::ConfigError(format!("{} must be a number, got {:?}", key, value)))
}
