//! Answer Classifier
//!
//! Scores a transcript with cheap lexical features and sorts it into one of
//! three bands:
//! - Accept: confident trivia answer (e.g., "Paris", "the answer is Mars")
//! - Escalate: ambiguous short utterance, needs the fallback oracle (e.g., "blue whale")
//! - Reject: noise, commands or questions (e.g., "what is the capital of France?")

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"\d+").unwrap();
    static ref CAPITALIZED_WORD: Regex = Regex::new(r"\b[A-Z][a-z]+").unwrap();
    static ref YEAR: Regex = Regex::new(r"\b(19|20)\d{2}\b").unwrap();
    static ref SPECIAL_CHARS: Regex = Regex::new(r"[!@#$%^&*()]").unwrap();
}

const QUESTION_WORDS: &[&str] = &["what", "when", "where", "who", "how", "why"];
const COMMAND_WORDS: &[&str] = &["stop", "next", "skip", "bank", "answer"];
const INDICATOR_PHRASES: &[&str] = &["answer is", "solution is", "it is", "its"];
const FUNCTION_WORDS: &[&str] = &["a", "an", "the", "in", "on", "at", "by", "to", "for"];

/// Tunables for the rule set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Shortest normalized text worth scoring
    pub min_length: usize,
    /// Longest normalized text still considered a concise answer
    pub max_length: usize,
    /// Scores strictly above this are accepted without the oracle
    pub accept_above: i32,
    /// Lowest score that is escalated to the oracle
    pub escalate_from: i32,
    /// Word budget for the short-phrase bonus
    pub short_phrase_max_words: usize,
    pub command_words: Vec<String>,
    pub indicator_phrases: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length: 100,
            accept_above: 4,
            escalate_from: 2,
            short_phrase_max_words: 3,
            command_words: COMMAND_WORDS.iter().map(|w| w.to_string()).collect(),
            indicator_phrases: INDICATOR_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Rule-based verdict for one transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAnalysis {
    pub score: i32,
    pub is_answer: bool,
    pub needs_ai_check: bool,
}

impl RuleAnalysis {
    pub const REJECTED: RuleAnalysis = RuleAnalysis {
        score: 0,
        is_answer: false,
        needs_ai_check: false,
    };
}

/// Stateless lexical classifier
#[derive(Debug, Clone, Default)]
pub struct AnswerClassifier {
    config: ClassifierConfig,
}

impl AnswerClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Score a transcript and decide accept / escalate / reject
    pub fn analyze_text(&self, text: &str) -> RuleAnalysis {
        let original = text.trim();
        let normalized = original.to_lowercase();

        let length = normalized.chars().count();
        if length < self.config.min_length || length > self.config.max_length {
            return RuleAnalysis::REJECTED;
        }

        if self.is_command(&normalized) || is_question(&normalized) {
            return RuleAnalysis::REJECTED;
        }

        let has_indicator = self.has_indicator_phrase(&normalized);

        let mut score = 0;
        if DIGITS.is_match(&normalized) {
            score += 1;
        }
        if CAPITALIZED_WORD.is_match(original) {
            score += 2;
        }
        if YEAR.is_match(&normalized) {
            score += 2;
        }
        if !SPECIAL_CHARS.is_match(&normalized) {
            score += 1;
        }
        if has_indicator {
            score += 3;
        }
        score += self.short_phrase_bonus(original);

        if has_indicator || score > self.config.accept_above {
            RuleAnalysis {
                score,
                is_answer: true,
                needs_ai_check: false,
            }
        } else if score >= self.config.escalate_from {
            RuleAnalysis {
                score,
                is_answer: false,
                needs_ai_check: true,
            }
        } else {
            RuleAnalysis {
                score,
                is_answer: false,
                needs_ai_check: false,
            }
        }
    }

    fn is_command(&self, normalized: &str) -> bool {
        self.config.command_words.iter().any(|cmd| cmd == normalized)
    }

    /// Apostrophes are dropped first so "it's" matches "its"
    fn has_indicator_phrase(&self, normalized: &str) -> bool {
        let collapsed: String = normalized
            .chars()
            .filter(|c| !matches!(c, '\'' | '\u{2019}'))
            .collect();
        let tokens: Vec<&str> = words(&collapsed).collect();

        self.config.indicator_phrases.iter().any(|phrase| {
            let phrase: Vec<&str> = phrase.split_whitespace().collect();
            !phrase.is_empty()
                && tokens
                    .windows(phrase.len())
                    .any(|window| window == phrase.as_slice())
        })
    }

    /// +3 for a terse phrase with a content word, +1 more if that phrase is capitalized
    fn short_phrase_bonus(&self, original: &str) -> i32 {
        let tokens: Vec<&str> = original
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().count() > 1)
            .collect();

        if tokens.is_empty() || tokens.len() > self.config.short_phrase_max_words {
            return 0;
        }

        let content: Vec<&str> = tokens
            .into_iter()
            .filter(|w| !FUNCTION_WORDS.contains(&w.to_lowercase().as_str()))
            .collect();

        if !content.iter().any(|w| w.chars().all(char::is_alphabetic)) {
            return 0;
        }

        let capitalized = content
            .iter()
            .any(|w| w.chars().next().is_some_and(char::is_uppercase));

        if capitalized {
            4
        } else {
            3
        }
    }
}

/// Interrogatives only count as whole words ("somewhat" is fine)
fn is_question(normalized: &str) -> bool {
    normalized.contains('?') || words(normalized).any(|w| QUESTION_WORDS.contains(&w))
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> RuleAnalysis {
        AnswerClassifier::new().analyze_text(text)
    }

    #[test]
    fn test_length_gate() {
        let too_long = "x".repeat(101);
        let cases = vec!["", " ", "a", "  b  ", too_long.as_str()];

        for c in cases {
            assert_eq!(analyze(c), RuleAnalysis::REJECTED, "input: {c:?}");
        }

        // boundaries are inclusive
        assert_ne!(analyze("ok"), RuleAnalysis::REJECTED);
        assert_ne!(analyze(&"y".repeat(100)), RuleAnalysis::REJECTED);
    }

    #[test]
    fn test_questions_rejected() {
        let cases = vec![
            "what is the capital of France?",
            "Who painted it",
            "is it Paris?",
            "how",
            "what's that",
            "???",
        ];

        for c in cases {
            assert_eq!(analyze(c), RuleAnalysis::REJECTED, "input: {c}");
        }
    }

    #[test]
    fn test_interrogative_needs_word_boundary() {
        let result = analyze("somewhat");
        assert!(result.score > 0);
    }

    #[test]
    fn test_exact_command_words_rejected() {
        for c in ["bank", "Next", " STOP ", "skip", "answer"] {
            assert_eq!(analyze(c), RuleAnalysis::REJECTED, "input: {c}");
        }
    }

    #[test]
    fn test_proper_noun_accepted() {
        // capitalized +2, clean +1, short phrase +3, capitalized phrase +1
        let result = analyze("Paris");
        assert_eq!(result.score, 7);
        assert!(result.is_answer);
        assert!(!result.needs_ai_check);
    }

    #[test]
    fn test_ambiguous_phrase_escalates() {
        for c in ["blue whale", "platelets", "the twins"] {
            let result = analyze(c);
            assert_eq!(result.score, 4, "input: {c}");
            assert!(result.needs_ai_check, "input: {c}");
            assert!(!result.is_answer, "input: {c}");
        }
    }

    #[test]
    fn test_indicator_overrides_band() {
        let result = analyze("i think the answer is mars actually");
        // indicator +3, clean +1 would only escalate on score alone
        assert_eq!(result.score, 4);
        assert!(result.is_answer);
        assert!(!result.needs_ai_check);

        assert!(analyze("the answer is Mars").is_answer);
        assert!(analyze("pretty sure its the moon").is_answer);
    }

    #[test]
    fn test_contraction_counts_as_indicator() {
        let result = analyze("it's the moon");
        assert!(result.is_answer);
        assert!(!result.needs_ai_check);
        assert_eq!(result.score, analyze("its the moon").score);

        // long enough to miss the short-phrase bonus, so only the indicator saves it
        let result = analyze("i think it's the blue whale");
        assert_eq!(result.score, 4);
        assert!(result.is_answer);

        assert!(analyze("pretty sure it\u{2019}s Jupiter").is_answer);
    }

    #[test]
    fn test_indicator_needs_whole_words() {
        // "its" inside "fruits" is not an indicator
        let result = analyze("lots of fruits and stuff here");
        assert!(!result.is_answer);
    }

    #[test]
    fn test_years_and_digits() {
        let result = analyze("Neil Armstrong in 1969");
        // capitalized +2, digits +1, year +2, clean +1
        assert_eq!(result.score, 6);
        assert!(result.is_answer);

        let result = analyze("1969");
        assert_eq!(result.score, 4);
        assert!(result.needs_ai_check);

        // outside 1900-2099
        assert_eq!(analyze("1850").score, 2);
    }

    #[test]
    fn test_low_score_rejected() {
        let result = analyze("i really do not know that one at all");
        assert_eq!(result.score, 1);
        assert!(!result.is_answer);
        assert!(!result.needs_ai_check);

        let result = analyze("(&&) @@");
        assert_eq!(result.score, 0);
        assert!(!result.needs_ai_check);
    }

    #[test]
    fn test_function_words_alone_get_no_bonus() {
        // only "an" and "the" survive the length filter, both function words
        let result = analyze("an the");
        assert_eq!(result.score, 1);
        assert!(!result.needs_ai_check);
    }

    #[test]
    fn test_analysis_is_pure() {
        let classifier = AnswerClassifier::new();
        for c in ["Paris", "blue whale", "what?", "Neil Armstrong in 1969"] {
            assert_eq!(classifier.analyze_text(c), classifier.analyze_text(c));
        }
    }

    #[test]
    fn test_custom_bands() {
        let classifier = AnswerClassifier::with_config(ClassifierConfig {
            accept_above: 3,
            ..ClassifierConfig::default()
        });

        let result = classifier.analyze_text("blue whale");
        assert!(result.is_answer);
        assert!(!result.needs_ai_check);
        assert_eq!(classifier.config().accept_above, 3);
    }
}
