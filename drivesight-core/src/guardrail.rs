//! Post-processing filter for generated summaries.

use regex::Regex;

use crate::error::{Error, Result};

/// Replacement for redacted words.
pub const REDACTION: &str = "[redacted]";

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone)]
pub struct GuardrailConfig {
    /// Maximum summary length in characters, ellipsis included
    pub max_chars: usize,
    /// Redacted case-insensitively, together with inflections that start
    /// with them ("hack" also covers "hacking")
    pub disallowed_words: Vec<String>,
    /// Text used when the filtered summary is empty
    pub empty_fallback: String,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            max_chars: 500,
            disallowed_words: [
                "ignore",
                "bypass",
                "disable",
                "hack",
                "exploit",
                "private",
                "secret",
                "password",
                "credential",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            empty_fallback: "Risk assessment completed. Please review driving conditions."
                .to_string(),
        }
    }
}

/// Enforces length and content constraints. Never fails on input text.
#[derive(Debug, Clone)]
pub struct Guardrail {
    pattern: Option<Regex>,
    config: GuardrailConfig,
}

impl Guardrail {
    pub fn new(config: GuardrailConfig) -> Result<Self> {
        if config.max_chars <= ELLIPSIS.len() {
            return Err(Error::Config(format!(
                "guardrail max_chars must exceed {}",
                ELLIPSIS.len()
            )));
        }

        let pattern = compile(&config.disallowed_words)?;
        Ok(Self { pattern, config })
    }

    pub fn config(&self) -> &GuardrailConfig {
        &self.config
    }

    pub fn apply(&self, text: &str) -> String {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

        let redacted = match &self.pattern {
            Some(pattern) => pattern.replace_all(&collapsed, REDACTION).into_owned(),
            None => collapsed,
        };

        if redacted.is_empty() {
            return self.config.empty_fallback.clone();
        }

        truncate_chars(&redacted, self.config.max_chars)
    }
}

impl Default for Guardrail {
    fn default() -> Self {
        let config = GuardrailConfig::default();
        let pattern = compile(&config.disallowed_words).ok().flatten();
        Self { pattern, config }
    }
}

fn compile(disallowed_words: &[String]) -> Result<Option<Regex>> {
    let words: Vec<String> = disallowed_words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();

    if words.is_empty() {
        return Ok(None);
    }

    let source = format!(r"(?i)\b(?:{})\w*\b", words.join("|"));
    Regex::new(&source)
        .map(Some)
        .map_err(|e| Error::Config(format!("invalid guardrail pattern: {e}")))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_clean_text_through() {
        let guardrail = Guardrail::default();
        let text = "Risk level LOW: clear road, light traffic.";
        assert_eq!(guardrail.apply(text), text);
    }

    #[test]
    fn test_redacts_disallowed_words_case_insensitively() {
        let guardrail = Guardrail::default();
        let out = guardrail.apply("Ignore the signal and BYPASS the Password check.");
        assert_eq!(
            out,
            "[redacted] the signal and [redacted] the [redacted] check."
        );
    }

    #[test]
    fn test_redacts_inflected_forms() {
        let guardrail = Guardrail::default();
        let out = guardrail.apply("Hacking stored passwords and Credentials was ignored.");
        assert_eq!(
            out,
            "[redacted] stored [redacted] and [redacted] was [redacted]."
        );
    }

    #[test]
    fn test_matches_only_at_word_start() {
        let guardrail = Guardrail::default();
        // the word appears mid-word, not as a prefix
        let out = guardrail.apply("An unhackable lock and a nonsecret route.");
        assert_eq!(out, "An unhackable lock and a nonsecret route.");
    }

    #[test]
    fn test_truncates_to_max_length() {
        let guardrail = Guardrail::default();
        let long = "a".repeat(800);
        let out = guardrail.apply(&long);
        assert_eq!(out.chars().count(), 500);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let guardrail = Guardrail::new(GuardrailConfig {
            max_chars: 10,
            ..GuardrailConfig::default()
        })
        .unwrap();
        let out = guardrail.apply("ééééééééééééééé");
        assert_eq!(out, "ééééééé...");
    }

    #[test]
    fn test_empty_and_whitespace_fall_back() {
        let guardrail = Guardrail::default();
        let expected = GuardrailConfig::default().empty_fallback;
        assert_eq!(guardrail.apply(""), expected);
        assert_eq!(guardrail.apply("   \n\t "), expected);
    }

    #[test]
    fn test_collapses_whitespace() {
        let guardrail = Guardrail::default();
        assert_eq!(guardrail.apply("  Risk \n level   LOW  "), "Risk level LOW");
    }

    #[test]
    fn test_rejects_degenerate_max_length() {
        let result = Guardrail::new(GuardrailConfig {
            max_chars: 3,
            ..GuardrailConfig::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_word_list_disables_redaction() {
        let guardrail = Guardrail::new(GuardrailConfig {
            disallowed_words: vec![],
            ..GuardrailConfig::default()
        })
        .unwrap();
        assert_eq!(guardrail.apply("secret"), "secret");
    }
}
