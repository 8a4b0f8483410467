// HTTP client for the document backend
//
// Blocking, single request at a time, no retries. Every non-2xx status turns
// into an error naming the operation and the status code.

use crate::backend::DocumentBackend;
use crate::changelog::ChangeLogger;
use crate::config::EditorConfig;
use crate::types::*;
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const ANONYMOUS_USER: &str = "anonymous";

/// Content type for an uploadable file, decided by extension.
/// Only PDF and Word documents are accepted.
pub fn upload_mime_type(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => Ok(PDF_MIME),
        Some("docx") => Ok(DOCX_MIME),
        _ => Err(anyhow!(
            "Please upload a PDF or DOCX file (got {})",
            path.display()
        )),
    }
}

pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.api_base(), config.timeout_secs.map(Duration::from_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        what: &str,
        url: &str,
        body: &B,
    ) -> Result<T> {
        tracing::debug!("POST {url}");
        let response = check_status(what, self.agent.post(url).send_json(body))?;
        response
            .into_json()
            .with_context(|| format!("{what}: invalid response body"))
    }

    fn get_json<T: DeserializeOwned>(&self, what: &str, url: &str) -> Result<T> {
        tracing::debug!("GET {url}");
        let response = check_status(what, self.agent.get(url).call())?;
        response
            .into_json()
            .with_context(|| format!("{what}: invalid response body"))
    }

    // ============================================================================
    // Documents
    // ============================================================================

    /// Upload a PDF or DOCX and get its extracted text back.
    /// An empty `username` is sent as `anonymous`.
    pub fn upload_document(&self, path: &Path, username: &str) -> Result<UploadResponse> {
        let mime = upload_mime_type(path)?;
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let username = if username.trim().is_empty() {
            ANONYMOUS_USER
        } else {
            username
        };

        let form = MultipartForm::new()
            .file("file", filename, mime, &bytes)
            .text("username", username);
        let url = self.url(&["upload-pdf"]);
        tracing::info!("uploading {filename} ({} bytes)", bytes.len());

        let response = check_status(
            "Upload",
            self.agent
                .post(&url)
                .set("Content-Type", &form.content_type())
                .send_bytes(&form.finish()),
        )?;
        response
            .into_json()
            .context("Upload: invalid response body")
    }

    pub fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult> {
        self.post_json("Analysis", &self.url(&["analyze"]), request)
    }

    pub fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.post_json("Chat", &self.url(&["chat"]), request)
    }

    // ============================================================================
    // Change logs
    // ============================================================================

    pub fn log_change(&self, record: &ChangeRecord) -> Result<()> {
        let url = self.url(&["log-change"]);
        tracing::debug!("POST {url}");
        check_status("Log change", self.agent.post(&url).send_json(record))?;
        Ok(())
    }

    /// The shared, global change log
    pub fn get_log(&self) -> Result<LogResponse> {
        self.get_json("Fetching log", &self.url(&["get-log"]))
    }

    pub fn get_user_logs(&self, username: &str) -> Result<UserLogsResponse> {
        self.get_json("Fetching user logs", &self.url(&["get-user-logs", username]))
    }

    pub fn get_user_document_log(&self, username: &str, document: &str) -> Result<LogResponse> {
        self.get_json(
            "Fetching document log",
            &self.url(&["get-user-document-log", username, document]),
        )
    }

    // ============================================================================
    // Projects
    // ============================================================================

    pub fn list_projects(&self, username: &str) -> Result<ProjectsResponse> {
        self.get_json("Fetching projects", &self.url(&["projects", username]))
    }

    pub fn document_activity(&self, username: &str, document: &str) -> Result<ActivityLogResponse> {
        self.get_json(
            "Fetching activity log",
            &self.url(&["projects", username, document, "log"]),
        )
    }

    /// Raw content of one stored project file
    pub fn project_file(&self, username: &str, document: &str, file: &str) -> Result<String> {
        let url = self.url(&["projects", username, document, file]);
        tracing::debug!("GET {url}");
        let response = check_status("Fetching project file", self.agent.get(&url).call())?;
        response
            .into_string()
            .context("Fetching project file: unreadable body")
    }
}

impl DocumentBackend for ApiClient {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult> {
        ApiClient::analyze(self, request)
    }

    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        ApiClient::chat(self, request)
    }
}

impl ChangeLogger for ApiClient {
    fn log_change(&self, record: &ChangeRecord) -> Result<()> {
        ApiClient::log_change(self, record)
    }
}

fn check_status(
    what: &str,
    result: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(code, _)) => Err(anyhow!("{what} failed: {code}")),
        Err(e) => Err(anyhow::Error::new(e).context(format!("{what} failed"))),
    }
}

/// Minimal multipart/form-data encoder for the upload endpoint
struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    fn new() -> Self {
        Self {
            boundary: format!("redline-{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    fn file(mut self, name: &str, filename: &str, mime: &str, bytes: &[u8]) -> Self {
        let filename = filename.replace('"', "%22");
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pdf_and_docx_are_uploadable() {
        assert_eq!(upload_mime_type(Path::new("a/lease.pdf")).unwrap(), PDF_MIME);
        assert_eq!(upload_mime_type(Path::new("Memo.DOCX")).unwrap(), DOCX_MIME);
        assert!(upload_mime_type(Path::new("notes.txt")).is_err());
        assert!(upload_mime_type(Path::new("old.doc")).is_err());
        assert!(upload_mime_type(Path::new("no_extension")).is_err());
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let client = ApiClient::new("http://localhost:8000/", None);
        assert_eq!(
            client.url(&["projects", "jo smith", "Q3/report"]),
            "http://localhost:8000/projects/jo%20smith/Q3%2Freport"
        );
    }

    #[test]
    fn multipart_body_carries_both_fields() {
        let form = MultipartForm::new()
            .file("file", "lease.pdf", PDF_MIME, b"%PDF-1.4")
            .text("username", "alice");
        let boundary = form.boundary.clone();
        assert_eq!(
            form.content_type(),
            format!("multipart/form-data; boundary={boundary}")
        );

        let body = String::from_utf8(form.finish()).unwrap();
        assert!(body.contains("name=\"file\"; filename=\"lease.pdf\""));
        assert!(body.contains("Content-Type: application/pdf\r\n\r\n%PDF-1.4\r\n"));
        assert!(body.contains("name=\"username\"\r\n\r\nalice\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn rejected_upload_never_touches_the_network() {
        // Port 9 (discard) is never contacted: the mime check fails first
        let client = ApiClient::new("http://127.0.0.1:9", None);
        let err = client
            .upload_document(Path::new("notes.txt"), "alice")
            .unwrap_err();
        assert!(err.to_string().contains("PDF or DOCX"));
    }
}
