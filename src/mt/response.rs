//! Tolerant readers for back-end JSON payloads
//!
//! Public mirror deployments disagree on field names. Each logical value has
//! an ordered list of candidate keys; the first key holding a non-empty string
//! wins.

use serde_json::Value;

/// Lingva: keys under `info` that may carry the detected language
pub const LINGVA_DETECTED_KEYS: &[&str] = &["detectedSource", "source"];

/// Lingva: keys that may carry the translation
pub const LINGVA_TRANSLATION_KEYS: &[&str] = &["translation"];

/// SimplyTranslate: keys that may carry the translation
pub const SIMPLY_TRANSLATION_KEYS: &[&str] = &["translation", "result"];

/// SimplyTranslate: keys that may carry the detected language
pub const SIMPLY_DETECTED_KEYS: &[&str] = &["detected", "source"];

/// First non-empty string found under `keys`, in order
pub fn first_string<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Like `first_string`, but absent values read as empty
pub fn string_or_empty(value: &Value, keys: &[&str]) -> String {
    first_string(value, keys).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_key_wins() {
        let v = json!({"translation": "hello", "result": "other"});
        assert_eq!(first_string(&v, SIMPLY_TRANSLATION_KEYS), Some("hello"));
    }

    #[test]
    fn test_falls_back_to_alternate_key() {
        let v = json!({"result": "hello", "source": "fr"});
        assert_eq!(first_string(&v, SIMPLY_TRANSLATION_KEYS), Some("hello"));
        assert_eq!(first_string(&v, SIMPLY_DETECTED_KEYS), Some("fr"));
    }

    #[test]
    fn test_empty_and_non_string_values_are_skipped() {
        let v = json!({"detected": "", "source": "de"});
        assert_eq!(first_string(&v, SIMPLY_DETECTED_KEYS), Some("de"));

        let v = json!({"translation": 42, "result": null});
        assert_eq!(first_string(&v, SIMPLY_TRANSLATION_KEYS), None);
        assert_eq!(string_or_empty(&v, SIMPLY_TRANSLATION_KEYS), "");
    }

    #[test]
    fn test_non_object_reads_as_absent() {
        let v = json!(["not", "an", "object"]);
        assert_eq!(first_string(&v, LINGVA_DETECTED_KEYS), None);
    }
}
