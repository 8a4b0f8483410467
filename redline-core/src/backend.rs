// Backend abstraction for prompt handling
//
// The editor session only needs the two prompt endpoints. Keeping them behind a
// trait lets the session run against the HTTP client, a recorded fixture, or a
// test double without knowing which.

use crate::types::{AnalysisResult, AnalyzeRequest, ChatRequest, ChatResponse};
use anyhow::Result;

/// Remote service that analyzes documents and answers questions about them
pub trait DocumentBackend {
    /// Structured analysis: issues, highlighted markup, commentary
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult>;

    /// Conversational answer about the document
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}
