// src/utils/matcher.rs

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Reduces a free-text answer to its comparable form.
///
/// Lowercases, decomposes accented letters (NFD) and drops the combining marks,
/// then keeps only `[a-z0-9]`. "Chárizard!" and "CHARIZARD " both become "charizard".
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Exact equality of normalized forms. No fuzzy or partial matching.
pub fn matches(user_answer: &str, correct_answer: &str) -> bool {
    let user = normalize(user_answer);
    if user.is_empty() {
        return normalize(correct_answer).is_empty();
    }
    user == normalize(correct_answer)
}
