use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== ANALYSIS TYPES =====
// Shapes returned by the backend's /analyze endpoint. Only `highlighted_text`
// and `issues_found` are guaranteed; the rule-based fallback on the backend
// omits everything else.

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub highlighted_text: String,
    /// Legacy issue strings, see `Issue::parse_legacy`. Referenced by position.
    pub issues_found: Vec<String>,
    #[serde(default)]
    pub total_issues: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colleague_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_intelligence: Option<DocumentIntelligence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appeal_score: Option<AppealScore>,
    #[serde(default)]
    pub contextual_insights: Vec<String>,
    #[serde(default)]
    pub strategic_recommendations: Vec<String>,
    #[serde(default)]
    pub actionable_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentIntelligence {
    #[serde(default, rename = "type")]
    pub document_type: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub assessment: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppealScore {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub key_improvements: Vec<String>,
    #[serde(default)]
    pub competitive_advantages: Vec<String>,
}

// ===== PROMPT ROUTING =====

/// Which backend endpoint a free-form prompt is sent to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Conversational answer from /chat
    Question,
    /// Structured issue list from /analyze
    AnalysisRequest,
}

// ===== TRANSCRIPT =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Ai,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<AnalysisResult>,
}

impl ChatMessage {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            analysis_data: None,
        }
    }

    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.analysis_data = Some(analysis);
        self
    }
}

// ===== WIRE TYPES =====
// Request and response bodies for the remaining backend endpoints.
// Field names are part of the backend contract; do not rename.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeRequest {
    pub text: String,
    pub custom_prompt: String,
    pub username: String,
    pub document_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub text: String,
    pub question: String,
    pub username: String,
    pub document_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub text: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One applied change, posted to /log-change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeRecord {
    pub category: String,
    pub original_text: String,
    pub suggested_text: String,
    pub document_name: String,
    pub username: String,
    pub reason: String,
    pub timestamp: String,
}

/// Response of /get-log and /get-user-document-log
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogResponse {
    pub status: String,
    #[serde(default)]
    pub log_content: String,
    #[serde(default)]
    pub total_entries: usize,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserLogsResponse {
    pub status: String,
    #[serde(default)]
    pub documents: Vec<DocumentLogSummary>,
    #[serde(default)]
    pub total_documents: usize,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentLogSummary {
    pub document_name: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub total_entries: usize,
    /// Seconds since the Unix epoch, as reported by the backend
    #[serde(default)]
    pub last_modified: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub total_projects: usize,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub document_name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub created: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: String,
    /// "original", "extracted" or "log"
    #[serde(default, rename = "type")]
    pub file_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityLogResponse {
    #[serde(default)]
    pub log_entries: Vec<ActivityEntry>,
    #[serde(default)]
    pub total_entries: usize,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub action: String,
    pub description: String,
    #[serde(default)]
    pub raw_line: String,
}
