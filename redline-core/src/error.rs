use thiserror::Error;

/// Errors surfaced by editor operations.
///
/// Infrastructure failures (HTTP, IO, serialization) travel as `anyhow::Error`;
/// this enum covers the outcomes a caller is expected to show the user.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Issue index {index} is out of range ({total} issues)")]
    IssueIndexOutOfRange { index: usize, total: usize },

    #[error("Suggestion {0} has already been applied")]
    AlreadyApplied(usize),

    /// The issue string has no single `" → "` separator, so there is nothing to apply
    #[error("Issue {index} has no applicable suggestion: {raw}")]
    InertIssue { index: usize, raw: String },

    #[error("Could not find text to replace: \"{original}\"")]
    SuggestionNotFound { original: String },

    #[error("A request is already in progress")]
    RequestInFlight,

    #[error("Please enter or upload some text to analyze")]
    EmptyDocument,

    #[error("No analysis results available")]
    NoAnalysis,

    #[error(transparent)]
    Backend(anyhow::Error),
}

/// Legacy issue string could not be split into its parts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueParseError {
    #[error("expected exactly one ' → ' separator, found {0}")]
    Separator(usize),

    #[error("original text is empty")]
    EmptyOriginal,
}
