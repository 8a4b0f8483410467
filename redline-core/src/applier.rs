use crate::config::{ApplierConfig, EditorConfig, HighlightConfig, ReplacementScope};
use crate::issue::Issue;
use crate::markup;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// Which step of the fallback chain produced the edit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplyStrategy {
    /// Literal, case-sensitive match in the markup text
    Direct,
    /// Escaped, case-insensitive match in the markup text
    CaseInsensitive,
    /// Text only exists across inline tags; its first word marked
    PartialWord,
    /// Nothing matched; note appended to the end of the document
    NoteAppended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub new_markup: String,
    pub applied: bool,
    /// What was actually found and replaced, for the change log
    pub matched_text: Option<String>,
    pub strategy: Option<ApplyStrategy>,
}

impl ApplyOutcome {
    fn unchanged(markup: &str) -> Self {
        Self {
            new_markup: markup.to_string(),
            applied: false,
            matched_text: None,
            strategy: None,
        }
    }
}

/// A successful rewrite from one strategy
struct Replacement {
    markup: String,
    matched_text: Option<String>,
}

/// One step of the fallback chain. Returns None to defer to the next step.
trait ReplacementStrategy {
    fn try_apply(&self, issue: &Issue, html: &str, highlight: &HighlightConfig)
        -> Option<Replacement>;

    fn kind(&self) -> ApplyStrategy;
}

struct DirectReplacement;

impl ReplacementStrategy for DirectReplacement {
    fn try_apply(
        &self,
        issue: &Issue,
        html: &str,
        highlight: &HighlightConfig,
    ) -> Option<Replacement> {
        let span = markup::highlight_span(&issue.original_text, &issue.suggested_text, highlight);
        let (rewritten, _) = markup::replace_first_in_text(html, &issue.original_text, &span)?;
        Some(Replacement {
            markup: rewritten,
            matched_text: Some(issue.original_text.clone()),
        })
    }

    fn kind(&self) -> ApplyStrategy {
        ApplyStrategy::Direct
    }
}

struct CaseInsensitiveReplacement {
    scope: ReplacementScope,
}

impl ReplacementStrategy for CaseInsensitiveReplacement {
    fn try_apply(
        &self,
        issue: &Issue,
        html: &str,
        highlight: &HighlightConfig,
    ) -> Option<Replacement> {
        let pattern = RegexBuilder::new(&regex::escape(&issue.original_text))
            .case_insensitive(true)
            .build()
            .ok()?;
        let mut hits = markup::find_in_text(html, &pattern);
        let matched_text = html[hits.first()?.clone()].to_string();
        if self.scope == ReplacementScope::FirstMatch {
            hits.truncate(1);
        }

        let span = markup::highlight_span(&issue.original_text, &issue.suggested_text, highlight);
        Some(Replacement {
            markup: markup::replace_ranges(html, &hits, &span),
            matched_text: Some(matched_text),
        })
    }

    fn kind(&self) -> ApplyStrategy {
        ApplyStrategy::CaseInsensitive
    }
}

struct PartialWordReplacement;

impl ReplacementStrategy for PartialWordReplacement {
    fn try_apply(
        &self,
        issue: &Issue,
        html: &str,
        highlight: &HighlightConfig,
    ) -> Option<Replacement> {
        let plain = markup::PlainText::from_markup(html);
        let found = plain.text.find(&issue.original_text)?;
        let original = issue.original_text.as_str();
        let lead = original.len() - original.trim_start().len();
        let first_word = original.split_whitespace().next()?;

        // The word must sit verbatim in one text run at the located position
        let start = plain.markup_offset(found + lead)?;
        let end = start + first_word.len();
        if html.get(start..end) != Some(first_word) {
            return None;
        }

        let span = markup::highlight_span(original, &issue.suggested_text, highlight);
        Some(Replacement {
            markup: markup::replace_ranges(html, &[start..end], &span),
            matched_text: Some(first_word.to_string()),
        })
    }

    fn kind(&self) -> ApplyStrategy {
        ApplyStrategy::PartialWord
    }
}

struct NoteAppend;

impl ReplacementStrategy for NoteAppend {
    fn try_apply(
        &self,
        issue: &Issue,
        html: &str,
        highlight: &HighlightConfig,
    ) -> Option<Replacement> {
        let mut rewritten = html.to_string();
        rewritten.push_str(&markup::applied_note(&issue.suggested_text, highlight));
        Some(Replacement {
            markup: rewritten,
            matched_text: None,
        })
    }

    fn kind(&self) -> ApplyStrategy {
        ApplyStrategy::NoteAppended
    }
}

/// Applies one issue's suggestion to document markup.
///
/// Strategies run in order and the first one that rewrites the markup wins:
/// direct literal match, case-insensitive escaped match, first-word match in
/// the rendered text, and (when enabled) an appended note. Matching only ever
/// looks at text runs, never inside tags or attribute values.
pub struct SuggestionApplier {
    strategies: Vec<Box<dyn ReplacementStrategy + Send + Sync>>,
    highlight: HighlightConfig,
}

impl Default for SuggestionApplier {
    fn default() -> Self {
        Self::new(&ApplierConfig::default(), HighlightConfig::default())
    }
}

impl SuggestionApplier {
    pub fn new(config: &ApplierConfig, highlight: HighlightConfig) -> Self {
        let mut strategies: Vec<Box<dyn ReplacementStrategy + Send + Sync>> = vec![
            Box::new(DirectReplacement),
            Box::new(CaseInsensitiveReplacement {
                scope: config.replacement_scope,
            }),
        ];
        if config.plain_text_fallback {
            strategies.push(Box::new(PartialWordReplacement));
        }
        if config.append_note_on_miss {
            strategies.push(Box::new(NoteAppend));
        }

        Self {
            strategies,
            highlight,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(&config.applier, config.highlight.clone())
    }

    /// Apply `issues[issue_index]` to `current_markup`.
    ///
    /// An out-of-range index yields an unapplied outcome with the markup untouched.
    /// Whether the index was applied before is the caller's concern.
    pub fn apply(&self, issue_index: usize, issues: &[Issue], current_markup: &str) -> ApplyOutcome {
        match issues.get(issue_index) {
            Some(issue) => self.apply_issue(issue, current_markup),
            None => ApplyOutcome::unchanged(current_markup),
        }
    }

    pub fn apply_issue(&self, issue: &Issue, current_markup: &str) -> ApplyOutcome {
        for strategy in &self.strategies {
            if let Some(replacement) = strategy.try_apply(issue, current_markup, &self.highlight) {
                tracing::debug!(
                    strategy = ?strategy.kind(),
                    original = %issue.original_text,
                    "suggestion applied"
                );
                return ApplyOutcome {
                    new_markup: replacement.markup,
                    applied: true,
                    matched_text: replacement.matched_text,
                    strategy: Some(strategy.kind()),
                };
            }
        }

        tracing::debug!(original = %issue.original_text, "no strategy matched");
        ApplyOutcome::unchanged(current_markup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLIED: &str = markup::APPLIED_CLASS;

    fn issue(original: &str, suggested: &str) -> Issue {
        Issue::new("Spelling", original, suggested)
    }

    fn span(original: &str, suggested: &str) -> String {
        markup::highlight_span(original, suggested, &HighlightConfig::default())
    }

    #[test]
    fn direct_replaces_only_first_occurrence() {
        let applier = SuggestionApplier::default();
        let markup = "I recieve it. You recieve it.";
        let outcome = applier.apply_issue(&issue("recieve", "receive"), markup);

        assert!(outcome.applied);
        assert_eq!(outcome.strategy, Some(ApplyStrategy::Direct));
        assert_eq!(outcome.matched_text.as_deref(), Some("recieve"));
        assert_eq!(
            outcome.new_markup,
            format!("I {} it. You recieve it.", span("recieve", "receive"))
        );
    }

    #[test]
    fn direct_leaves_surrounding_bytes_identical() {
        let applier = SuggestionApplier::default();
        let markup = "<p>Alpha <em>beta</em> gamma</p>";
        let outcome = applier.apply_issue(&issue("gamma", "delta"), markup);
        let inserted = span("gamma", "delta");

        assert!(outcome.new_markup.starts_with("<p>Alpha <em>beta</em> "));
        assert!(outcome.new_markup.ends_with("</p>"));
        assert_eq!(
            outcome.new_markup.len(),
            markup.len() - "gamma".len() + inserted.len()
        );
    }

    #[test]
    fn case_insensitive_fallback_matches_literally() {
        let applier = SuggestionApplier::default();
        let markup = "Call A.B(C) now, not axb(c).";
        let outcome = applier.apply_issue(&issue("a.b(c)", "the helper"), markup);

        assert!(outcome.applied);
        assert_eq!(outcome.strategy, Some(ApplyStrategy::CaseInsensitive));
        assert_eq!(outcome.matched_text.as_deref(), Some("A.B(C)"));
        assert!(outcome.new_markup.contains("not axb(c)."));
    }

    #[test]
    fn case_insensitive_scope_is_configurable() {
        let markup = "Okay. OKAY. okay.";
        let first = SuggestionApplier::default().apply_issue(&issue("oKay", "acceptable"), markup);
        assert_eq!(first.new_markup.matches(APPLIED).count(), 1);

        let config = ApplierConfig {
            replacement_scope: ReplacementScope::AllMatches,
            ..ApplierConfig::default()
        };
        let all = SuggestionApplier::new(&config, HighlightConfig::default())
            .apply_issue(&issue("oKay", "acceptable"), markup);
        assert_eq!(all.new_markup.matches(APPLIED).count(), 3);
    }

    #[test]
    fn dollar_signs_in_suggestion_are_not_expanded() {
        let outcome = SuggestionApplier::default()
            .apply_issue(&issue("FEE", "$100 ($1)"), "The fee is due.");
        assert!(outcome.new_markup.contains(">$100 ($1)</span>"));
    }

    #[test]
    fn partial_word_fallback_marks_first_token() {
        let markup = "<p>the <b>quick</b> brown fox</p>";
        let outcome =
            SuggestionApplier::default().apply_issue(&issue("the quick brown", "a fast brown"), markup);

        assert!(outcome.applied);
        assert_eq!(outcome.strategy, Some(ApplyStrategy::PartialWord));
        assert_eq!(outcome.matched_text.as_deref(), Some("the"));
        assert!(outcome.new_markup.starts_with("<p><span"));
        assert!(outcome.new_markup.ends_with("<b>quick</b> brown fox</p>"));
    }

    #[test]
    fn partial_word_fallback_can_be_disabled() {
        let config = ApplierConfig {
            plain_text_fallback: false,
            ..ApplierConfig::default()
        };
        let outcome = SuggestionApplier::new(&config, HighlightConfig::default())
            .apply_issue(&issue("the quick", "a fast"), "the <b>quick</b>");
        assert!(!outcome.applied);
    }

    #[test]
    fn tooltip_attributes_are_not_rewritten() {
        let markup = "We will <span style='color: #a00;' title='CHANGE: recieve → receive | WHY: typo' data-issue-index='0'>recieve</span> payment.";
        let outcome = SuggestionApplier::default().apply_issue(&issue("recieve", "receive"), markup);

        assert_eq!(outcome.strategy, Some(ApplyStrategy::Direct));
        assert!(outcome
            .new_markup
            .contains("title='CHANGE: recieve → receive | WHY: typo' data-issue-index='0'><span"));
        assert_eq!(markup::plain_text(&outcome.new_markup), "We will receive payment.");
    }

    #[test]
    fn case_insensitive_skips_attribute_matches() {
        let markup = "<span title='Tenant'>x</span> the TENANT pays";
        let outcome = SuggestionApplier::default().apply_issue(&issue("tenant", "Lessee"), markup);

        assert_eq!(outcome.strategy, Some(ApplyStrategy::CaseInsensitive));
        assert_eq!(outcome.matched_text.as_deref(), Some("TENANT"));
        assert!(outcome.new_markup.starts_with("<span title='Tenant'>x</span> the <span"));
        assert_eq!(markup::plain_text(&outcome.new_markup), "x the Lessee pays");
    }

    #[test]
    fn repeated_issue_moves_to_next_occurrence() {
        let applier = SuggestionApplier::default();
        let fix = issue("recieve", "receive");

        let first = applier.apply_issue(&fix, "I recieve it. You recieve it.");
        let second = applier.apply_issue(&fix, &first.new_markup);

        assert!(second.applied);
        assert_eq!(
            markup::plain_text(&first.new_markup),
            "I receive it. You recieve it."
        );
        assert_eq!(
            markup::plain_text(&second.new_markup),
            "I receive it. You receive it."
        );
    }

    #[test]
    fn partial_word_targets_located_text_not_earlier_substring() {
        let markup = "<p>Another day, the <b>late</b> fee applies</p>";
        let outcome =
            SuggestionApplier::default().apply_issue(&issue("the late fee", "the penalty"), markup);

        assert_eq!(outcome.strategy, Some(ApplyStrategy::PartialWord));
        assert!(outcome.new_markup.starts_with("<p>Another day, <span"));
        assert_eq!(
            markup::plain_text(&outcome.new_markup),
            "Another day, the penalty late fee applies"
        );
    }

    #[test]
    fn partial_word_gives_up_when_first_word_is_split() {
        let outcome = SuggestionApplier::default()
            .apply_issue(&issue("late fee", "penalty"), "<p><b>la</b>te fee</p>");
        assert!(!outcome.applied);
    }

    #[test]
    fn missing_text_reports_failure_without_change() {
        let markup = "<p>Nothing to see</p>";
        let outcome = SuggestionApplier::default().apply_issue(&issue("absent", "present"), markup);

        assert!(!outcome.applied);
        assert_eq!(outcome.new_markup, markup);
        assert_eq!(outcome.matched_text, None);
        assert_eq!(outcome.strategy, None);
    }

    #[test]
    fn note_append_when_enabled() {
        let config = ApplierConfig {
            append_note_on_miss: true,
            ..ApplierConfig::default()
        };
        let outcome = SuggestionApplier::new(&config, HighlightConfig::default())
            .apply_issue(&issue("absent", "present"), "<p>Body</p>");

        assert!(outcome.applied);
        assert_eq!(outcome.strategy, Some(ApplyStrategy::NoteAppended));
        assert!(outcome.new_markup.starts_with("<p>Body</p><br><span"));
        assert!(outcome.new_markup.contains("✓ Applied: present"));
    }

    #[test]
    fn out_of_range_index_is_unapplied() {
        let issues = vec![issue("a", "b")];
        let outcome = SuggestionApplier::default().apply(3, &issues, "a");
        assert!(!outcome.applied);
        assert_eq!(outcome.new_markup, "a");
    }
}
