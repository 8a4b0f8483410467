/// A canned prompt offered alongside the free-text input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub prompt: &'static str,
}

pub const PROMPT_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        name: "Legal Document Review",
        prompt: "Review this document and find specific text that needs fixing. Give me exact replacements for spelling, grammar, legal terminology, and clarity issues.",
    },
    PromptTemplate {
        name: "Academic Paper",
        prompt: "Make this document more legally precise. Find weak language, informal terms, and ambiguous phrases that need stronger legal wording.",
    },
    PromptTemplate {
        name: "Business Communication",
        prompt: "Polish this document to professional standards. Fix formatting, tone, and language to make it sound more authoritative and credible.",
    },
    PromptTemplate {
        name: "Technical Documentation",
        prompt: "Improve the clarity and logical flow. Find confusing sentences, unclear terms, and awkward phrasing that need to be rewritten.",
    },
    PromptTemplate {
        name: "Creative Writing",
        prompt: "What are the key obligations, rights, and deadlines I should know about? Explain the most important parts.",
    },
    PromptTemplate {
        name: "General Analysis",
        prompt: "What potential problems, loopholes, or risks do you see in this document? What should I be concerned about?",
    },
];

/// Look up a template by name, ignoring case and surrounding whitespace
pub fn find_template(name: &str) -> Option<&'static PromptTemplate> {
    let wanted = name.trim();
    PROMPT_TEMPLATES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(wanted))
}
