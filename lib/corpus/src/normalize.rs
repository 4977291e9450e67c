//! Text normalization for catalog fields.
//!
//! Produces the plain text the index shingles: HTML entities decoded,
//! lowercase ASCII letters and digits only, single spaces, trimmed.

use serde_json::Value;
use std::borrow::Cow;

#[derive(Debug, Clone, Default)]
pub struct NormalizeConfig {
    /// Drop `<...>` markup before cleaning. Off by default: tag names then
    /// survive as plain words, which is how the catalog was indexed so far.
    pub strip_tags: bool,
}

/// Normalize one raw text value.
pub fn normalize_text(raw: &str, config: &NormalizeConfig) -> String {
    let text = if config.strip_tags {
        strip_tags(raw)
    } else {
        raw.to_string()
    };
    let text = decode_entities(&text).replace("\\\"", " ");

    let mut result = String::with_capacity(text.len());
    let mut last_was_space = true;
    for ch in text.chars().flat_map(char::to_lowercase) {
        let ch = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            ' '
        };
        if ch == ' ' {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }

    if result.ends_with(' ') {
        result.pop();
    }
    result
}

/// Replace markup between `<` and `>` with a space.
pub fn strip_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
}

/// Expand HTML character references the way a browser does in body text:
/// the full HTML5 named set, numeric references, and the legacy names that
/// are recognised without a trailing `;`. Unknown references stay verbatim.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    htmlize::unescape(text)
}

/// Flatten a JSON field (string, list, nested object) into one text string.
/// Returns `None` for null and for values with no text in them.
pub fn flatten_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => join_parts(items.iter()),
        Value::Object(map) => join_parts(map.values()),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn join_parts<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values.filter_map(flatten_value).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(s: &str) -> String {
        normalize_text(s, &NormalizeConfig::default())
    }

    #[test]
    fn test_lowercase_and_punctuation() {
        assert_eq!(norm("  Ice-Maker, 2.5 Gal!  "), "ice maker 2 5 gal");
        assert_eq!(norm("Wash\n\tDry"), "wash dry");
        assert_eq!(norm(""), "");
        assert_eq!(norm("!!!"), "");
    }

    #[test]
    fn test_entities_decoded_then_cleaned() {
        assert_eq!(norm("Salt &amp; Pepper"), "salt pepper");
        assert_eq!(norm("5&quot; hose"), "5 hose");
        assert_eq!(norm("caf&#233;"), "caf");
        assert_eq!(decode_entities("caf&#xE9;"), "café");
        assert_eq!(decode_entities("a &bogus; b"), "a &bogus; b");
        assert_eq!(decode_entities("AT&T"), "AT&T");
    }

    #[test]
    fn test_html5_named_entities() {
        assert_eq!(decode_entities("40&deg; &ndash; 5&frac12;"), "40\u{b0} \u{2013} 5\u{bd}");
        assert_eq!(
            norm("Whirlpool&rsquo;s 5&frac12; in 40&deg; &ndash; kit"),
            "whirlpool s 5 in 40 kit"
        );
    }

    #[test]
    fn test_entities_without_semicolon() {
        assert_eq!(decode_entities("Salt &amp Pepper"), "Salt & Pepper");
        assert_eq!(norm("Salt &amp Pepper"), "salt pepper");
        assert_eq!(norm("5&quot hose &lt 3 ft"), "5 hose 3 ft");
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(norm("12\\\"wide"), "12 wide");
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(norm("Crème Brûlée"), "cr me br l e");
    }

    #[test]
    fn test_tags() {
        let html = "<tr><th>Weight</th><td>2 kg</td></tr>";
        assert_eq!(norm(html), "tr th weight th td 2 kg td tr");
        let cfg = NormalizeConfig { strip_tags: true };
        assert_eq!(normalize_text(html, &cfg), "weight 2 kg");
    }

    #[test]
    fn test_flatten_value() {
        assert_eq!(flatten_value(&json!(null)), None);
        assert_eq!(flatten_value(&json!([])), None);
        assert_eq!(flatten_value(&json!(["  "])), None);
        assert_eq!(flatten_value(&json!("x")).as_deref(), Some("x"));
        assert_eq!(
            flatten_value(&json!(["Fits GE", ["and", "Hotpoint"], null])).as_deref(),
            Some("Fits GE and Hotpoint")
        );
        assert_eq!(flatten_value(&json!({"a": 1, "b": true})).as_deref(), Some("1 true"));
    }
}
