//! Text normalization: identity slugs and style keyword extraction.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Style vocabulary matched against wine descriptions. A keyword fires when
/// any word of the description starts with one of its stems.
pub const STYLE_STEMS: &[(&str, &[&str])] = &[
    ("elegant", &["elegan"]),
    ("complex", &["complex"]),
    ("mineral", &["miner"]),
    ("fruity", &["frut"]),
    ("floral", &["flor"]),
    ("woody_oak", &["madeira", "carvalho"]),
    ("fresh", &["fresc"]),
    ("acidic", &["acidez"]),
    ("structured", &["tanino", "encorp"]),
    ("balanced", &["equilibr"]),
    ("persistent", &["persist"]),
];

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity slug for a display name.
///
/// Diacritics are stripped through canonical decomposition, the result is
/// lowercased, and every run of characters outside `[a-z0-9]` becomes a
/// single `-`. Leading and trailing separators are trimmed.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.nfd().filter(|c| !is_combining_mark(*c)) {
        let folded: &str = match ch {
            'œ' | 'Œ' => "oe",
            'æ' | 'Æ' => "ae",
            'ß' => "ss",
            _ => "",
        };
        if !folded.is_empty() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push_str(folded);
            continue;
        }

        if ch.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Style keywords found in a free-text description, in vocabulary order.
pub fn extract_style_keywords(description: &str) -> Vec<String> {
    let lowered = description.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    STYLE_STEMS
        .iter()
        .filter(|(_, stems)| {
            words
                .iter()
                .any(|word| stems.iter().any(|stem| word.starts_with(stem)))
        })
        .map(|(keyword, _)| (*keyword).to_string())
        .collect()
}
