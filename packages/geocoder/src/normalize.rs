//! Text normalization shared by corpus loading and query processing.
//!
//! The same pipeline is applied to every address level of every hierarchy
//! entry and to every incoming query, so that tokens can be compared
//! verbatim. "Île-de-France" and "ile de france" both become
//! `["ile", "de", "france"]`.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Any run of characters that are neither letters nor digits separates
/// tokens.
static DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid regex"));

/// Normalizes a string without splitting it.
///
/// The pipeline:
/// 1. NFKD decomposition
/// 2. Drop combining marks (diacritics)
/// 3. Lowercase
#[must_use]
pub fn normalize(input: &str) -> String {
    let stripped: String = input.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.to_lowercase()
}

/// Normalizes a string and splits it into tokens.
///
/// Returns an empty vector for input consisting only of delimiters.
#[must_use]
pub fn tokenize(input: &str) -> Vec<String> {
    let normalized = normalize(input);
    DELIMITER_RE
        .split(&normalized)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits() {
        assert_eq!(tokenize("Rue de la Paix"), ["rue", "de", "la", "paix"]);
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(tokenize("Île-de-France"), ["ile", "de", "france"]);
        assert_eq!(tokenize("Köln"), ["koln"]);
    }

    #[test]
    fn splits_on_punctuation() {
        assert_eq!(tokenize("10, Main St."), ["10", "main", "st"]);
        assert_eq!(tokenize("  a//b  "), ["a", "b"]);
    }

    #[test]
    fn keeps_non_latin_scripts() {
        assert_eq!(tokenize("Москва, ул. Тверская"), ["москва", "ул", "тверская"]);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" ,.;- ").is_empty());
    }

    #[test]
    fn normalize_keeps_spacing() {
        assert_eq!(normalize("Straße Ü"), "straße u");
    }
}
