// Redline Core Library
//
// Applies AI-suggested edits to document markup and routes free-form prompts
// to the right backend endpoint. The editor session ties both together and is
// what the CLI drives.

pub mod types;
pub mod error;
pub mod issue;
pub mod config;
pub mod markup;
pub mod applier;
pub mod classifier;
pub mod templates;
pub mod changelog;
pub mod backend;
pub mod session;
pub mod store;
pub mod client;

// Re-export main types for easy use
pub use types::*;
pub use error::{EditorError, IssueParseError};
pub use issue::{CategoryKind, Issue};
pub use config::EditorConfig;
pub use applier::{ApplyOutcome, ApplyStrategy, SuggestionApplier};
pub use classifier::{HeuristicClassifier, PromptClassifier};
pub use changelog::{ChangeLogger, MemoryChangeLog, NoOpChangeLogger};
pub use backend::DocumentBackend;
pub use session::{EditorSession, IssueEntry, PendingPrompt, PendingRequest, PromptOutcome};
pub use store::{FileSessionStore, SessionStore};
pub use client::ApiClient;
