use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w+\b").expect("static pattern is valid"))
}

/// Tokenizes `text` into words of length >= 3, lowercased unless
/// `case_sensitive` is set. Shorter tokens (articles, prepositions) are
/// dropped as noise, matching the reference lexical matcher.
pub fn tokenize(text: &str, case_sensitive: bool) -> Vec<String> {
    let haystack = if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    };
    word_pattern()
        .find_iter(&haystack)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.len() >= 3)
        .collect()
}

pub fn tokenize_set(text: &str, case_sensitive: bool) -> HashSet<String> {
    tokenize(text, case_sensitive).into_iter().collect()
}
