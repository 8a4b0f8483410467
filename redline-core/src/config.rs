use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Base URL of the document backend
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout. None waits for the backend indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Suggestion application behaviour
    #[serde(default)]
    pub applier: ApplierConfig,
    /// Inline styling of applied suggestions
    #[serde(default)]
    pub highlight: HighlightConfig,
}

/// How many regex-fallback matches a single suggestion rewrites
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementScope {
    /// One issue, one location
    #[default]
    FirstMatch,
    /// Every case-insensitive occurrence
    AllMatches,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplierConfig {
    #[serde(default)]
    pub replacement_scope: ReplacementScope,
    /// Mark the first word when the text only exists across inline tags
    #[serde(default = "default_true")]
    pub plain_text_fallback: bool,
    /// Append an "Applied:" note when the original text is nowhere to be found
    #[serde(default = "default_false")]
    pub append_note_on_miss: bool,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            replacement_scope: ReplacementScope::FirstMatch,
            plain_text_fallback: true,
            append_note_on_miss: false,
        }
    }
}

fn default_background() -> String {
    "#20b2aa".to_string()
}

fn default_text_color() -> String {
    "white".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// CSS background of an applied suggestion
    #[serde(default = "default_background")]
    pub background: String,
    /// CSS text colour of an applied suggestion
    #[serde(default = "default_text_color")]
    pub text_color: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            text_color: default_text_color(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: None,
            applier: ApplierConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: EditorConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => match Self::load_from_file(p) {
                Ok(config) => {
                    tracing::info!("loaded config from {p}");
                    config
                }
                Err(e) => {
                    eprintln!("⚠️  Failed to load config from {p}, using defaults: {e:#}");
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: EditorConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.applier.replacement_scope, ReplacementScope::FirstMatch);
        assert!(config.applier.plain_text_fallback);
        assert!(!config.applier.append_note_on_miss);
        assert_eq!(config.highlight.background, "#20b2aa");
    }

    #[test]
    fn partial_yaml_overrides_only_given_fields() {
        let yaml = "api_url: https://editor.example.com/\napplier:\n  replacement_scope: all_matches\n";
        let config: EditorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api_base(), "https://editor.example.com");
        assert_eq!(config.applier.replacement_scope, ReplacementScope::AllMatches);
        assert!(config.applier.plain_text_fallback);
    }

    #[test]
    fn load_with_fallback_tolerates_missing_file() {
        let config = EditorConfig::load_with_fallback(Some("/nonexistent/redline.yaml"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn load_with_fallback_uses_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redline.yaml");
        std::fs::write(&path, "api_url: http://localhost:9000
").unwrap();

        let config = EditorConfig::load_with_fallback(path.to_str());
        assert_eq!(config.api_base(), "http://localhost:9000");
    }

    #[test]
    fn load_with_fallback_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redline.yaml");
        std::fs::write(&path, "api_url: [unclosed\n").unwrap();

        assert!(EditorConfig::load_from_file(path.to_str().unwrap()).is_err());
        let config = EditorConfig::load_with_fallback(path.to_str());
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
