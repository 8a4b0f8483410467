use crate::applier::{ApplyOutcome, SuggestionApplier};
use crate::backend::DocumentBackend;
use crate::changelog::ChangeLogger;
use crate::classifier::PromptClassifier;
use crate::error::EditorError;
use crate::issue::Issue;
use crate::markup;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const UNTITLED_DOCUMENT: &str = "untitled";
const WHOLE_DOCUMENT_PROMPT: &str = "Analyze the whole document";

/// A request that has been routed but not yet answered
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrompt {
    pub kind: PromptKind,
    pub request: PendingRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PendingRequest {
    Analyze(AnalyzeRequest),
    Chat(ChatRequest),
}

/// What the backend sent back for a pending prompt
#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome {
    Analysis(AnalysisResult),
    Answer(ChatResponse),
}

/// One row of the issue list, as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct IssueEntry {
    pub index: usize,
    pub raw: String,
    /// None when the issue is inert
    pub issue: Option<Issue>,
    pub applied: bool,
}

/// Editing state for one user working on one document at a time.
///
/// Holds the editable markup, the latest analysis, the set of issue indices
/// already applied to the markup, and the chat transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorSession {
    pub username: String,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    original_text: String,
    #[serde(default)]
    markup: String,
    #[serde(default)]
    analysis: Option<AnalysisResult>,
    #[serde(default)]
    applied: BTreeSet<usize>,
    #[serde(default)]
    transcript: Vec<ChatMessage>,
    #[serde(skip)]
    busy: bool,
}

impl EditorSession {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    // ============================================================================
    // Document state
    // ============================================================================

    /// Start over with freshly extracted plain text
    pub fn load_document(&mut self, name: impl Into<String>, text: &str) {
        self.reset(name.into(), text.to_string(), markup::escape_html(text));
    }

    /// Start over with existing markup
    pub fn load_markup(&mut self, name: impl Into<String>, markup: &str) {
        self.reset(name.into(), markup::plain_text(markup), markup.to_string());
    }

    fn reset(&mut self, name: String, original_text: String, markup: String) {
        self.document_name = Some(name);
        self.original_text = original_text;
        self.markup = markup;
        self.analysis = None;
        self.applied.clear();
    }

    /// Direct user edit of the markup
    pub fn set_markup(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
    }

    /// Replace the current analysis. The markup becomes the backend's
    /// highlighted text and nothing counts as applied any more.
    pub fn set_analysis(&mut self, analysis: AnalysisResult) {
        self.markup = analysis.highlighted_text.clone();
        self.analysis = Some(analysis);
        self.applied.clear();
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn applied(&self) -> &BTreeSet<usize> {
        &self.applied
    }

    pub fn is_applied(&self, index: usize) -> bool {
        self.applied.contains(&index)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn document_name_or_default(&self) -> &str {
        self.document_name.as_deref().unwrap_or(UNTITLED_DOCUMENT)
    }

    /// Every issue of the current analysis, inert ones included
    pub fn issues(&self) -> Vec<IssueEntry> {
        let Some(analysis) = &self.analysis else {
            return Vec::new();
        };
        analysis
            .issues_found
            .iter()
            .enumerate()
            .map(|(index, raw)| IssueEntry {
                index,
                raw: raw.clone(),
                issue: Issue::parse_legacy(raw).ok(),
                applied: self.applied.contains(&index),
            })
            .collect()
    }

    // ============================================================================
    // Suggestions
    // ============================================================================

    /// Apply the suggestion of issue `index` to the markup.
    ///
    /// On success the index joins the applied set and `logger` is notified.
    /// A logger failure is reported and otherwise ignored. On any error the
    /// markup and applied set are left exactly as they were.
    pub fn apply_suggestion(
        &mut self,
        index: usize,
        applier: &SuggestionApplier,
        logger: &dyn ChangeLogger,
    ) -> Result<ApplyOutcome, EditorError> {
        let analysis = self.analysis.as_ref().ok_or(EditorError::NoAnalysis)?;
        let total = analysis.issues_found.len();
        let raw = analysis
            .issues_found
            .get(index)
            .ok_or(EditorError::IssueIndexOutOfRange { index, total })?;

        if self.applied.contains(&index) {
            return Err(EditorError::AlreadyApplied(index));
        }

        let issue = Issue::parse_legacy(raw).map_err(|_| EditorError::InertIssue {
            index,
            raw: raw.clone(),
        })?;

        let outcome = applier.apply_issue(&issue, &self.markup);
        if !outcome.applied {
            return Err(EditorError::SuggestionNotFound {
                original: issue.original_text,
            });
        }

        self.markup = outcome.new_markup.clone();
        self.applied.insert(index);
        tracing::info!(
            index,
            strategy = ?outcome.strategy,
            "applied '{}' → '{}'",
            issue.original_text,
            issue.suggested_text
        );

        let record = ChangeRecord {
            category: issue.category,
            original_text: issue.original_text,
            suggested_text: issue.suggested_text,
            document_name: self.document_name_or_default().to_string(),
            username: self.username.clone(),
            reason: issue.reason.unwrap_or_default(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = logger.log_change(&record) {
            tracing::warn!("Error logging change: {e:#}");
        }

        Ok(outcome)
    }

    // ============================================================================
    // Prompts
    // ============================================================================

    /// Route `prompt` and record it in the transcript.
    ///
    /// Refused while another prompt is pending or when there is no text.
    /// The returned request must be answered with `finish_prompt`.
    pub fn begin_prompt(
        &mut self,
        prompt: &str,
        classifier: &dyn PromptClassifier,
    ) -> Result<PendingPrompt, EditorError> {
        if self.busy {
            return Err(EditorError::RequestInFlight);
        }

        let text = markup::plain_text(&self.markup);
        if text.trim().is_empty() {
            return Err(EditorError::EmptyDocument);
        }

        let prompt = prompt.trim();
        let kind = classifier.classify(prompt);
        let document_name = self.document_name_or_default().to_string();
        let request = match kind {
            PromptKind::AnalysisRequest => PendingRequest::Analyze(AnalyzeRequest {
                text,
                custom_prompt: prompt.to_string(),
                username: self.username.clone(),
                document_name,
            }),
            PromptKind::Question => PendingRequest::Chat(ChatRequest {
                text,
                question: prompt.to_string(),
                username: self.username.clone(),
                document_name,
            }),
        };

        let shown = if prompt.is_empty() {
            WHOLE_DOCUMENT_PROMPT
        } else {
            prompt
        };
        self.transcript.push(ChatMessage::new(MessageKind::User, shown));
        self.busy = true;
        tracing::info!(?kind, "prompt routed");

        Ok(PendingPrompt { kind, request })
    }

    /// Record the backend's answer to a pending prompt and release the busy gate
    pub fn finish_prompt(
        &mut self,
        pending: PendingPrompt,
        outcome: anyhow::Result<PromptOutcome>,
    ) -> Result<ChatMessage, EditorError> {
        self.busy = false;

        let message = match outcome {
            Ok(PromptOutcome::Analysis(analysis)) => {
                let summary = analysis_summary(&analysis);
                self.set_analysis(analysis.clone());
                ChatMessage::new(MessageKind::Ai, summary).with_analysis(analysis)
            }
            Ok(PromptOutcome::Answer(answer)) if answer.success != Some(false) => {
                ChatMessage::new(MessageKind::Ai, answer.response)
            }
            Ok(PromptOutcome::Answer(answer)) => {
                let detail = answer.error.unwrap_or_else(|| answer.response.clone());
                return Err(self.record_failure(
                    pending.kind,
                    anyhow::anyhow!("Chat failed: {detail}"),
                ));
            }
            Err(e) => return Err(self.record_failure(pending.kind, e)),
        };

        self.transcript.push(message.clone());
        Ok(message)
    }

    /// Classify, call the backend and record the answer in one step
    pub fn submit_prompt(
        &mut self,
        prompt: &str,
        classifier: &dyn PromptClassifier,
        backend: &dyn DocumentBackend,
    ) -> Result<ChatMessage, EditorError> {
        let pending = self.begin_prompt(prompt, classifier)?;
        let outcome = match &pending.request {
            PendingRequest::Analyze(request) => backend.analyze(request).map(PromptOutcome::Analysis),
            PendingRequest::Chat(request) => backend.chat(request).map(PromptOutcome::Answer),
        };
        self.finish_prompt(pending, outcome)
    }

    fn record_failure(&mut self, kind: PromptKind, error: anyhow::Error) -> EditorError {
        tracing::error!(?kind, "prompt failed: {error:#}");
        self.transcript
            .push(ChatMessage::new(MessageKind::Error, format!("Error: {error:#}")));
        EditorError::Backend(error)
    }
}

fn analysis_summary(analysis: &AnalysisResult) -> String {
    let count = analysis.issues_found.len();
    let found = match count {
        0 => "No issues found".to_string(),
        1 => "Found 1 issue".to_string(),
        n => format!("Found {n} issues"),
    };
    match &analysis.colleague_analysis {
        Some(colleague) if !colleague.is_empty() => format!("{colleague}\n{found}"),
        _ => found,
    }
}
