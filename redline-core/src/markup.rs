//! Markup utilities
//!
//! The editable document is an opaque HTML string. These helpers do the small
//! amount of HTML awareness the applier needs without building a DOM:
//!
//! - split markup into tag and text runs
//! - derive the rendered plain text (tags stripped, entities decoded)
//! - build the highlight span and the fallback note
//! - escape text for safe insertion

use crate::config::HighlightConfig;
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

// Longest reference worth decoding, e.g. "&#x10FFFF;"
const MAX_REFERENCE_LEN: usize = 16;

/// Class attached to every span the applier inserts
pub const APPLIED_CLASS: &str = "redline-applied";

/// Byte ranges of the text runs in `markup`, i.e. everything outside tags.
///
/// A `<` only opens a tag when followed by a letter, `/`, `!` or `?`. Inside a
/// tag, quoted attribute values may contain `>`. An unterminated tag swallows
/// the rest of the input, matching how a browser would treat it.
pub fn text_runs(markup: &str) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut run_start = 0;
    let mut in_tag = false;
    let mut quote: Option<char> = None;

    for (i, ch) in markup.char_indices() {
        if in_tag {
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(ch),
                (None, '>') => {
                    in_tag = false;
                    run_start = i + 1;
                }
                _ => {}
            }
        } else if ch == '<' && opens_tag(&markup[i + 1..]) {
            if i > run_start {
                runs.push(run_start..i);
            }
            in_tag = true;
        }
    }

    if !in_tag && run_start < markup.len() {
        runs.push(run_start..markup.len());
    }
    runs
}

fn opens_tag(rest: &str) -> bool {
    matches!(rest.chars().next(), Some(c) if c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

/// Rendered text of `markup`: tags removed, character references decoded
pub fn plain_text(markup: &str) -> String {
    PlainText::from_markup(markup).text
}

/// Rendered text plus, for every byte of it, the markup offset it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PlainText {
    pub text: String,
    offsets: Vec<usize>,
}

impl PlainText {
    pub fn from_markup(markup: &str) -> Self {
        let mut text = String::with_capacity(markup.len());
        let mut offsets = Vec::with_capacity(markup.len());

        for run in text_runs(markup) {
            let mut pos = run.start;
            while pos < run.end {
                let rest = &markup[pos..run.end];
                let (ch, consumed) = decode_reference(rest)
                    .unwrap_or_else(|| {
                        let ch = rest.chars().next().unwrap_or_default();
                        (ch, ch.len_utf8())
                    });
                for _ in 0..ch.len_utf8() {
                    offsets.push(pos);
                }
                text.push(ch);
                pos += consumed;
            }
        }

        Self { text, offsets }
    }

    /// Markup offset of the character starting at `text_offset`
    pub fn markup_offset(&self, text_offset: usize) -> Option<usize> {
        self.offsets.get(text_offset).copied()
    }
}

/// Decode a character reference at the very start of `text`.
/// Returns the character and the number of bytes the reference spans.
fn decode_reference(text: &str) -> Option<(char, usize)> {
    if !text.starts_with('&') {
        return None;
    }
    let end = text
        .bytes()
        .take(MAX_REFERENCE_LEN)
        .position(|b| b == b';')?
        + 1;
    let caps = ENTITY_REGEX.captures(&text[..end])?;
    if caps.get(0)?.range() != (0..end) {
        return None;
    }
    let body = &caps[1];
    let ch = if let Some(hex) = body.strip_prefix("#x").or(body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match body {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => None,
        }
    }?;
    Some((ch, end))
}

/// Decode named (common subset) and numeric character references.
/// Unknown references are left as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &Captures| match decode_reference(&caps[0]) {
            Some((ch, _)) => ch.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Escape text for use in element content or a double-quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Replace the first occurrence of `needle` that sits entirely inside one text run.
///
/// Returns the new markup and the byte offset where the replacement starts.
pub fn replace_first_in_text(
    markup: &str,
    needle: &str,
    replacement: &str,
) -> Option<(String, usize)> {
    if needle.is_empty() {
        return None;
    }

    text_runs(markup).into_iter().find_map(|run| {
        markup[run.clone()].find(needle).map(|offset| {
            let start = run.start + offset;
            let out = replace_ranges(markup, &[start..start + needle.len()], replacement);
            (out, start)
        })
    })
}

/// Every match of `pattern` lying entirely inside a text run, in document order
pub fn find_in_text(markup: &str, pattern: &Regex) -> Vec<Range<usize>> {
    text_runs(markup)
        .into_iter()
        .flat_map(|run| {
            pattern
                .find_iter(&markup[run.clone()])
                .map(move |m| run.start + m.start()..run.start + m.end())
                .collect::<Vec<_>>()
        })
        .filter(|range| !range.is_empty())
        .collect()
}

/// Splice `replacement` over each range. Ranges must be sorted and disjoint.
pub fn replace_ranges(markup: &str, ranges: &[Range<usize>], replacement: &str) -> String {
    let mut out = String::with_capacity(markup.len() + ranges.len() * replacement.len());
    let mut cursor = 0;
    for range in ranges {
        out.push_str(&markup[cursor..range.start]);
        out.push_str(replacement);
        cursor = range.end;
    }
    out.push_str(&markup[cursor..]);
    out
}

/// Inline element marking a suggestion-derived edit
pub fn highlight_span(original: &str, suggestion: &str, style: &HighlightConfig) -> String {
    format!(
        "<span class=\"{}\" data-redline=\"suggestion\" style=\"background-color: {}; color: {}; padding: 2px 4px; border-radius: 3px; font-weight: bold;\" title=\"Applied: {} → {}\">{}</span>",
        APPLIED_CLASS,
        escape_html(&style.background),
        escape_html(&style.text_color),
        escape_html(original),
        escape_html(suggestion),
        escape_html(suggestion),
    )
}

/// Visible note appended when the original text could not be located
pub fn applied_note(suggestion: &str, style: &HighlightConfig) -> String {
    format!(
        "<br><span class=\"{}\" data-redline=\"note\" style=\"background-color: {}; color: {}; padding: 4px 8px; border-radius: 4px; font-style: italic; display: inline-block; margin: 4px 0;\">✓ Applied: {}</span>",
        APPLIED_CLASS,
        escape_html(&style.background),
        escape_html(&style.text_color),
        escape_html(suggestion),
    )
}
