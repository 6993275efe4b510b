//! Escalation pipeline
//!
//! TRANSCRIPT → INTENT? → RULES → (ambiguous) ORACLE → VERDICT
//!
//! Oracle failures never escape: an ambiguous transcript that cannot be
//! verified is reported as "not an answer" with method `hybrid`.

use crate::classifier::AnswerClassifier;
use crate::error::PipelineError;
use crate::intent::{Intent, IntentDetector};
use crate::oracle::AnswerOracle;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(8);

/// Called with the original transcript whenever it is accepted as an answer
pub type AnswerObserver = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMethod {
    Rules,
    Hybrid,
}

/// Verdict surfaced to the game-state collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_answer: bool,
    pub method: ClassificationMethod,
    /// Rule-based score
    pub confidence: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Intent { intent: Intent },
    Classification(ClassificationResult),
}

impl PipelineOutcome {
    pub fn intent(&self) -> Option<Intent> {
        match self {
            PipelineOutcome::Intent { intent } => Some(*intent),
            PipelineOutcome::Classification(_) => None,
        }
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        match self {
            PipelineOutcome::Intent { .. } => None,
            PipelineOutcome::Classification(result) => Some(result),
        }
    }
}

/// Intent detection + rule scoring + oracle fallback
pub struct ClassificationPipeline {
    detector: IntentDetector,
    classifier: AnswerClassifier,
    oracle: Arc<dyn AnswerOracle>,
    oracle_timeout: Duration,
    answer_observer: Option<AnswerObserver>,
}

impl ClassificationPipeline {
    pub fn new(oracle: Arc<dyn AnswerOracle>) -> Self {
        Self {
            detector: IntentDetector::new(),
            classifier: AnswerClassifier::new(),
            oracle,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            answer_observer: None,
        }
    }

    pub fn with_detector(mut self, detector: IntentDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_classifier(mut self, classifier: AnswerClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    pub fn with_answer_observer(mut self, observer: AnswerObserver) -> Self {
        self.answer_observer = Some(observer);
        self
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Route one finalized transcript. Commands short-circuit classification.
    pub async fn process(&self, transcript: &str) -> PipelineOutcome {
        if let Some(intent) = self.detector.detect(transcript) {
            return PipelineOutcome::Intent { intent };
        }

        PipelineOutcome::Classification(self.classify(transcript).await)
    }

    /// Decide whether `text` is a trivia answer, escalating when the rules are unsure
    pub async fn classify(&self, text: &str) -> ClassificationResult {
        let analysis = self.classifier.analyze_text(text);

        debug!(
            score = analysis.score,
            needs_ai_check = analysis.needs_ai_check,
            "Rule analysis complete"
        );

        let result = if analysis.needs_ai_check {
            let is_answer = match self.consult_oracle(text).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!(oracle = self.oracle.name(), "Oracle failed, rejecting: {}", e);
                    false
                }
            };

            ClassificationResult {
                is_answer,
                method: ClassificationMethod::Hybrid,
                confidence: analysis.score,
            }
        } else {
            ClassificationResult {
                is_answer: analysis.is_answer,
                method: ClassificationMethod::Rules,
                confidence: analysis.score,
            }
        };

        info!(
            transcript = %text.trim(),
            is_answer = result.is_answer,
            method = ?result.method,
            confidence = result.confidence,
            "Transcript classified"
        );

        if result.is_answer {
            if let Some(observer) = &self.answer_observer {
                observer(text);
            }
        }

        result
    }

    async fn consult_oracle(&self, text: &str) -> Result<bool> {
        match tokio::time::timeout(self.oracle_timeout, self.oracle.judge(text)).await {
            Ok(verdict) => verdict,
            Err(_) => Err(PipelineError::OracleTimeout(self.oracle_timeout)),
        }
    }
}
