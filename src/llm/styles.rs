//! Reply-style system prompts

use serde::{Deserialize, Serialize};

const BASE_PROMPT: &str = "You are Nyaya, a legal information assistant. \
You explain laws, legal procedures, rights and documents in plain language. \
You give general legal information, not legal advice, and you suggest \
consulting a qualified lawyer when a question depends on the specific facts \
of someone's case. If a question is outside the legal domain, answer briefly \
and steer back to how you can help with legal matters.";

/// Named selection from the fixed set of reply styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StyleDirective {
    #[default]
    Default,
    Concise,
    Detailed,
    Formal,
    Simple,
}

impl StyleDirective {
    /// Every style, in menu order
    pub const ALL: [StyleDirective; 5] = [
        StyleDirective::Default,
        StyleDirective::Concise,
        StyleDirective::Detailed,
        StyleDirective::Formal,
        StyleDirective::Simple,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StyleDirective::Default => "Default",
            StyleDirective::Concise => "Concise",
            StyleDirective::Detailed => "Detailed",
            StyleDirective::Formal => "Formal",
            StyleDirective::Simple => "Simple",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(name.trim()))
    }

    /// The system prompt sent with every request made under this style.
    pub fn prompt(&self) -> String {
        let guidance = match self {
            StyleDirective::Default => {
                "Answer clearly and in a well-organised way. Use short headings \
                 or bullet points when they make the answer easier to follow."
            }
            StyleDirective::Concise => {
                "Keep the answer short: a few sentences or a brief list of the \
                 essential points. Leave out background unless it is necessary."
            }
            StyleDirective::Detailed => {
                "Give a thorough answer. Cover the relevant provisions, the \
                 usual procedure step by step, typical timelines, documents \
                 required and common pitfalls."
            }
            StyleDirective::Formal => {
                "Write in a formal, professional register suitable for a legal \
                 memorandum. Use precise terminology and cite the relevant \
                 statutes or sections where you can."
            }
            StyleDirective::Simple => {
                "Explain as you would to someone with no legal background. \
                 Avoid jargon; when a legal term is unavoidable, define it in \
                 everyday words and give a simple example."
            }
        };
        format!("{}\n\n{}", BASE_PROMPT, guidance)
    }
}

impl std::fmt::Display for StyleDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_style_has_distinct_prompt() {
        let prompts: Vec<String> = StyleDirective::ALL.iter().map(|s| s.prompt()).collect();
        for (i, a) in prompts.iter().enumerate() {
            assert!(a.starts_with("You are Nyaya"));
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(StyleDirective::from_name("Concise"), Some(StyleDirective::Concise));
        assert_eq!(StyleDirective::from_name(" formal "), Some(StyleDirective::Formal));
        assert_eq!(StyleDirective::from_name("Pirate"), None);
    }

    #[test]
    fn test_default_is_default() {
        assert_eq!(StyleDirective::default(), StyleDirective::Default);
        assert_eq!(StyleDirective::ALL[0].to_string(), "Default");
    }
}
