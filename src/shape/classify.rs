use once_cell::sync::Lazy;
use regex::Regex;

// Characters that make a tag key unusable as a relational column value.
static PROBLEM_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#).unwrap()
});

/// Outcome of classifying one raw tag key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass {
    /// The key contains a problem character; the whole tag is dropped.
    Rejected,
    /// A plain key with no namespace prefix.
    Regular,
    /// A `prefix:rest` key, split on the first colon only. `rest` keeps
    /// any further colons verbatim.
    Namespaced { prefix: String, rest: String },
}

/// Classify a raw tag key. Pure: the same key always classifies the same
/// way, and only the literal code points in the problem set matter.
pub fn classify_key(key: &str) -> KeyClass {
    if PROBLEM_CHARS.is_match(key) {
        return KeyClass::Rejected;
    }

    match key.split_once(':') {
        Some((prefix, rest)) => KeyClass::Namespaced {
            prefix: prefix.to_string(),
            rest: rest.to_string(),
        },
        None => KeyClass::Regular,
    }
}
