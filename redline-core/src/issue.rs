use crate::error::IssueParseError;
use serde::{Deserialize, Serialize};

const FIX_SEPARATOR: &str = " → ";
const REASON_SEPARATOR: &str = " | ";
const CATEGORY_SEPARATOR: &str = ": ";
const DEFAULT_CATEGORY: &str = "Issue";

/// One suggested edit: what to find, what to put there, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub category: String,
    pub original_text: String,
    pub suggested_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Issue {
    pub fn new(
        category: impl Into<String>,
        original_text: impl Into<String>,
        suggested_text: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            original_text: original_text.into(),
            suggested_text: suggested_text.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Parse the backend's string encoding `"Category: original → suggested | reason"`.
    ///
    /// Boundary-only: the backend still ships issues as delimited strings, so this
    /// exists to lift them into `Issue` records as soon as they arrive. Nothing past
    /// the API boundary should build or split these strings.
    ///
    /// - Exactly one `" → "` is required; anything else is an inert issue.
    /// - The reason is everything after the first `" | "` of the suggestion part,
    ///   so trailing `| Appeal: ...` segments stay with it.
    /// - Without `": "` the category is `Issue` and the whole left side is the original.
    pub fn parse_legacy(raw: &str) -> Result<Self, IssueParseError> {
        let parts: Vec<&str> = raw.split(FIX_SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(IssueParseError::Separator(parts.len() - 1));
        }
        let (error_part, fix_part) = (parts[0], parts[1]);

        let (category, original_text) = match error_part.find(CATEGORY_SEPARATOR) {
            Some(pos) => (
                error_part[..pos].trim(),
                &error_part[pos + CATEGORY_SEPARATOR.len()..],
            ),
            None => (DEFAULT_CATEGORY, error_part),
        };

        if original_text.is_empty() {
            return Err(IssueParseError::EmptyOriginal);
        }

        let (suggested_text, reason) = match fix_part.split_once(REASON_SEPARATOR) {
            Some((suggested, reason)) => (suggested, Some(reason.to_string())),
            None => (fix_part, None),
        };

        Ok(Self {
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            },
            original_text: original_text.to_string(),
            suggested_text: suggested_text.to_string(),
            reason,
        })
    }

    pub fn kind(&self) -> CategoryKind {
        CategoryKind::from_label(&self.category)
    }
}

/// Palette bucket for a free-text category label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Spelling,
    Grammar,
    Style,
    Legal,
    Clarity,
    Punctuation,
    Formatting,
    Other,
}

impl CategoryKind {
    /// Case-insensitive substring match; the first table entry found wins.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        let table = [
            ("spelling", CategoryKind::Spelling),
            ("grammar", CategoryKind::Grammar),
            ("style", CategoryKind::Style),
            ("legal", CategoryKind::Legal),
            ("clarity", CategoryKind::Clarity),
            ("punctuation", CategoryKind::Punctuation),
            ("formatting", CategoryKind::Formatting),
        ];
        table
            .iter()
            .find(|(needle, _)| label.contains(needle))
            .map(|(_, kind)| *kind)
            .unwrap_or(CategoryKind::Other)
    }

    /// Badge colour used when listing issues
    pub fn badge_color(&self) -> &'static str {
        match self {
            CategoryKind::Spelling => "#dc3545",
            CategoryKind::Grammar => "#28a745",
            CategoryKind::Style => "#ffc107",
            CategoryKind::Legal => "#6f42c1",
            CategoryKind::Clarity => "#17a2b8",
            CategoryKind::Punctuation => "#dc3545",
            CategoryKind::Formatting => "#6f42c1",
            CategoryKind::Other => "#6c757d",
        }
    }
}
