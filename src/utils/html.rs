use std::collections::HashSet;

use ammonia::Builder;

/// Clean a player name before it is persisted.
///
/// Every tag is stripped with ammonia (script and style bodies are dropped
/// entirely) and the result is trimmed. The name is stored as plain text, so the
/// entities ammonia emits for text are decoded back. A name that is only markup
/// comes back empty.
pub fn clean_player_name(input: &str) -> String {
    let stripped = Builder::default()
        .tags(HashSet::new())
        .clean(input.trim())
        .to_string();

    decode_text_entities(&stripped).trim().to_string()
}

/// Reverses the escaping html5ever applies to text nodes.
/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;`, not `<`.
fn decode_text_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
