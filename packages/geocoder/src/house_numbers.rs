//! House number recognition and matching.
//!
//! Query windows that follow a matched street are checked here before the
//! buildings linked to that street are compared against them. Matching is
//! tolerant of formatting ("10a", "10 a", "10-a" are the same number) but
//! not of misspellings.

use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Words that may precede a house number without being part of it.
static PREFIX_WORDS: LazyLock<BTreeSet<&'static str>> = LazyLock::new(|| {
    BTreeSet::from([
        "house", "no", "nr", "number", "n", "numero", "num", "дом", "д", "nummer",
    ])
});

/// Maximum number of tokens a house number may span.
const MAX_HOUSE_NUMBER_TOKENS: usize = 4;

/// Maximum length of a purely alphabetic house number part ("a", "bis").
const MAX_SUFFIX_CHARS: usize = 3;

fn strip_prefix_words<S: AsRef<str>>(tokens: &[S]) -> &[S] {
    let skip = tokens
        .iter()
        .take_while(|t| {
            let t: &str = (*t).as_ref();
            PREFIX_WORDS.contains(t)
        })
        .count();
    &tokens[skip..]
}

/// Returns `true` if the tokens look like a house number: a leading
/// number optionally followed by short suffix parts ("12", "12 a",
/// "12 к 1", "no 5").
#[must_use]
pub fn looks_like_house_number<S: AsRef<str>>(tokens: &[S]) -> bool {
    let rest = strip_prefix_words(tokens);

    let Some(first) = rest.first() else {
        return false;
    };
    if rest.len() > MAX_HOUSE_NUMBER_TOKENS {
        return false;
    }
    if !first.as_ref().starts_with(|c: char| c.is_ascii_digit()) {
        return false;
    }

    rest.iter().all(|t| {
        let t: &str = t.as_ref();
        t.chars().any(|c| c.is_ascii_digit()) || t.chars().count() <= MAX_SUFFIX_CHARS
    })
}

/// Reduces a house number to a separator-free canonical form.
fn canonical<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for token in strip_prefix_words(tokens) {
        out.push_str(token.as_ref());
    }
    out
}

/// Returns `true` if the house number stored on a building matches the
/// house number typed in a query.
#[must_use]
pub fn house_numbers_match<R: AsRef<str>, Q: AsRef<str>>(real: &[R], query: &[Q]) -> bool {
    let real = canonical(real);
    !real.is_empty() && real == canonical(query)
}
