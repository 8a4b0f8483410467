// All editing logic is in redline-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod profile;

// Re-export core types for convenience
pub use redline_core::*;

// Re-export CLI utilities
pub use profile::{LoginRecord, ProfileStore};
