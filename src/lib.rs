//! Trivia Voice Router
//!
//! Turns finalized speech transcripts from a voice-driven trivia game into
//! game actions:
//! - Detects spoken commands (bank, next team, stop, answer)
//! - Scores everything else with deterministic lexical rules
//! - Escalates ambiguous utterances to an LLM judge, failing closed
//! - Feeds transcripts through an explicit listening session
//!
//! PIPELINE:
//! TRANSCRIPT → INTENT? → RULES → ORACLE? → VERDICT

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gemini;
pub mod intent;
pub mod openai;
pub mod oracle;
pub mod pipeline;
pub mod session;

pub use error::Result;

// Re-export common types
pub use classifier::{AnswerClassifier, ClassifierConfig, RuleAnalysis};
pub use intent::{Intent, IntentDetector};
pub use oracle::AnswerOracle;
pub use pipeline::{ClassificationMethod, ClassificationPipeline, ClassificationResult, PipelineOutcome};
pub use session::{ListeningSession, TranscriptSegment, TranscriptSource};
