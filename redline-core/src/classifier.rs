use crate::types::PromptKind;
use regex::Regex;
use std::sync::LazyLock;

/// Decides where a free-form prompt is routed
pub trait PromptClassifier {
    fn classify(&self, prompt: &str) -> PromptKind;
}

// Analysis intent always wins, even over an explicit question mark
static ANALYSIS_INTENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"analy[sz]e",
        r"review",
        r"check.*error",
        r"find.*(error|issue)",
        r"correct",
        r"fix",
        r"improve",
        r"suggest",
        r"focus on",
        r"look for",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static QUESTION_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(what|how|why|when|where|who|which|can|could|should|would|is|are|does|do|will)\b")
        .unwrap()
});

static EXPLANATION_PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"explain",
        r"tell me",
        r"help me understand",
        r"what does .* mean",
        r"what is",
        r"what are",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Keyword heuristic. Deterministic and total; accuracy is best-effort.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    fn has_analysis_intent(&self, text: &str) -> bool {
        ANALYSIS_INTENT.iter().any(|pattern| pattern.is_match(text))
    }

    fn is_question(&self, text: &str) -> bool {
        text.contains('?')
            || QUESTION_LEAD.is_match(text)
            || EXPLANATION_PHRASES.iter().any(|pattern| pattern.is_match(text))
    }
}

impl PromptClassifier for HeuristicClassifier {
    fn classify(&self, prompt: &str) -> PromptKind {
        let text = prompt.trim().to_lowercase();

        let kind = if text.is_empty() || self.has_analysis_intent(&text) {
            PromptKind::AnalysisRequest
        } else if self.is_question(&text) {
            PromptKind::Question
        } else {
            PromptKind::AnalysisRequest
        };

        tracing::debug!(?kind, "classified prompt");
        kind
    }
}
