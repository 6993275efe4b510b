//! Intent Detector
//!
//! Spots game commands in a finalized transcript:
//! - BANK: lock in the current chain value
//! - NEXT: hand over to the next team
//! - STOP: end the round
//! - ANSWER: explicit "answer" keyword
//!
//! Matching is plain substring search over the lowercased transcript, first
//! match wins in table order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Bank,
    Next,
    Stop,
    Answer,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Bank => "BANK",
            Intent::Next => "NEXT",
            Intent::Stop => "STOP",
            Intent::Answer => "ANSWER",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called synchronously with the matched tag
pub type IntentObserver = Arc<dyn Fn(Intent) + Send + Sync>;

/// Static keyword lists — zero allocation
const BANK_KEYWORDS: &[&str] = &["bank", "banking", "save points"];
const NEXT_KEYWORDS: &[&str] = &["next", "next team", "skip"];
const STOP_KEYWORDS: &[&str] = &["stop", "end", "finish"];
const ANSWER_KEYWORDS: &[&str] = &["answer"];

/// Default table, in priority order
pub const DEFAULT_INTENT_PATTERNS: &[(Intent, &[&str])] = &[
    (Intent::Bank, BANK_KEYWORDS),
    (Intent::Next, NEXT_KEYWORDS),
    (Intent::Stop, STOP_KEYWORDS),
    (Intent::Answer, ANSWER_KEYWORDS),
];

/// Keyword-driven intent detector
#[derive(Clone)]
pub struct IntentDetector {
    patterns: Vec<(Intent, Vec<String>)>,
    observer: Option<IntentObserver>,
}

impl IntentDetector {
    pub fn new() -> Self {
        let patterns = DEFAULT_INTENT_PATTERNS
            .iter()
            .map(|(intent, keywords)| {
                (*intent, keywords.iter().map(|kw| kw.to_string()).collect())
            })
            .collect();

        Self {
            patterns,
            observer: None,
        }
    }

    /// Replace the keyword table. Order of `patterns` is the match priority.
    pub fn with_patterns(patterns: Vec<(Intent, Vec<String>)>) -> Self {
        let patterns = patterns
            .into_iter()
            .map(|(intent, keywords)| {
                let keywords = keywords
                    .into_iter()
                    .map(|kw| kw.trim().to_lowercase())
                    .filter(|kw| !kw.is_empty())
                    .collect();
                (intent, keywords)
            })
            .collect();

        Self {
            patterns,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: IntentObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn patterns(&self) -> &[(Intent, Vec<String>)] {
        &self.patterns
    }

    /// Return the first intent whose keywords occur in the transcript
    pub fn detect(&self, transcript: &str) -> Option<Intent> {
        let normalized = transcript.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let intent = self
            .patterns
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| normalized.contains(kw.as_str())))
            .map(|(intent, _)| *intent)?;

        info!(intent = %intent, transcript = %normalized, "Intent detected");

        if let Some(observer) = &self.observer {
            observer(intent);
        }

        Some(intent)
    }
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_command_phrases() {
        let detector = IntentDetector::new();
        let cases = vec![
            ("bank", Intent::Bank),
            ("let's bank now", Intent::Bank),
            ("  SAVE POINTS please ", Intent::Bank),
            ("next team", Intent::Next),
            ("skip this one", Intent::Next),
            ("stop", Intent::Stop),
            ("we're finished", Intent::Stop),
            ("final answer", Intent::Answer),
        ];

        for (text, expected) in cases {
            assert_eq!(detector.detect(text), Some(expected), "input: {text}");
        }
    }

    #[test]
    fn test_no_intent() {
        let detector = IntentDetector::new();
        assert_eq!(detector.detect(""), None);
        assert_eq!(detector.detect("   "), None);
        assert_eq!(detector.detect("Paris"), None);
        assert_eq!(detector.detect("blue whale"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let detector = IntentDetector::new();
        // BANK is ahead of NEXT and STOP in the table
        assert_eq!(detector.detect("bank it then next team"), Some(Intent::Bank));
        assert_eq!(detector.detect("skip and stop"), Some(Intent::Next));
    }

    #[test]
    fn test_substring_false_positive_is_kept() {
        let detector = IntentDetector::new();
        // "end" sits inside "legend"
        assert_eq!(detector.detect("the legend of zelda"), Some(Intent::Stop));
    }

    #[test]
    fn test_observer_receives_tag() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let detector = IntentDetector::new().with_observer(Arc::new(move |intent| {
            sink.lock().unwrap().push(intent);
        }));

        detector.detect("bank");
        detector.detect("Paris");
        detector.detect("next");

        assert_eq!(*seen.lock().unwrap(), vec![Intent::Bank, Intent::Next]);
    }

    #[test]
    fn test_custom_patterns() {
        let detector = IntentDetector::with_patterns(vec![
            (Intent::Stop, vec!["Game Over".to_string()]),
            (Intent::Bank, vec!["bank".to_string(), "  ".to_string()]),
        ]);

        assert_eq!(detector.detect("game over, bank"), Some(Intent::Stop));
        assert_eq!(detector.detect("anything"), None);
        assert_eq!(detector.patterns()[1].1, vec!["bank".to_string()]);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&Intent::Bank).unwrap(), "\"BANK\"");
        assert_eq!(Intent::Next.to_string(), "NEXT");
    }
}
