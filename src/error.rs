//! Error types for the utterance routing pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {

    // =============================
    // Boundary Errors
    // =============================

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // Oracle Errors
    // =============================

    #[error("Oracle error: {0}")]
    OracleError(String),

    #[error("Oracle did not answer within {0:?}")]
    OracleTimeout(Duration),

    #[error("Unrecognized oracle reply: {0:?}")]
    OracleReply(String),

    #[error("Oracle not configured: {0}")]
    OracleNotConfigured(String),

    // =============================
    // Session Errors
    // =============================

    #[error("Speech capture unsupported: {0}")]
    SpeechUnsupported(String),

    #[error("Listening session is closed")]
    SessionClosed,

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
