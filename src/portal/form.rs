//! `application/x-www-form-urlencoded` body decoding.
//!
//! Pairs are split on `&`, then on the first `=`. `+` becomes a space.
//! Percent-escapes are left as-is: a network name containing `%`, `&`
//! or `=` will not round-trip through the setup form.

use std::collections::BTreeMap;

pub type FormFields = BTreeMap<String, String>;

/// Decode a form body. Pairs without `=` are skipped; a repeated key
/// keeps its last value. Invalid UTF-8 is replaced, never rejected.
pub fn decode(body: &[u8]) -> FormFields {
    let text = String::from_utf8_lossy(body);
    let mut fields = FormFields::new();

    for pair in text.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        fields.insert(key.replace('+', " "), value.replace('+', " "));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_setup_submission() {
        let f = decode(b"ssid=Home&password=Secret123");
        assert_eq!(f.get("ssid").map(String::as_str), Some("Home"));
        assert_eq!(f.get("password").map(String::as_str), Some("Secret123"));
    }

    #[test]
    fn plus_becomes_space() {
        let f = decode(b"ssid=My+Home+Net&password=a+b");
        assert_eq!(f["ssid"], "My Home Net");
        assert_eq!(f["password"], "a b");
    }

    #[test]
    fn value_keeps_everything_after_first_equals() {
        let f = decode(b"password=a=b=c");
        assert_eq!(f["password"], "a=b=c");
    }

    #[test]
    fn pairs_without_equals_are_dropped() {
        let f = decode(b"flag&ssid=x&&");
        assert_eq!(f.len(), 1);
        assert_eq!(f["ssid"], "x");
    }

    #[test]
    fn empty_value_is_kept() {
        let f = decode(b"ssid=&password=pw");
        assert_eq!(f["ssid"], "");
    }

    #[test]
    fn last_duplicate_wins() {
        let f = decode(b"ssid=a&ssid=b");
        assert_eq!(f["ssid"], "b");
    }

    #[test]
    fn percent_escapes_are_not_decoded() {
        let f = decode(b"ssid=Caf%C3%A9");
        assert_eq!(f["ssid"], "Caf%C3%A9");
    }

    #[test]
    fn empty_body_has_no_fields() {
        assert!(decode(b"").is_empty());
    }
}
