//! Request path matching.
//!
//! The gateway serves exactly one route, `/user/{subject}/ticket`, so the
//! match is a literal prefix/suffix check rather than a router.

use std::borrow::Cow;

use thiserror::Error;

const PREFIX: &str = "/user/";
const SUFFIX: &str = "/ticket";

/// The request path is not `/user/{subject}/ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad request path '{path}'")]
pub struct BadPath {
    /// The raw (undecoded) request path.
    pub path: String,
}

/// Extract the subject username from a raw request path.
///
/// The path is percent-decoded first, so `%20` becomes a space and an encoded
/// `%2F` becomes a separator (and is rejected). Malformed escapes and
/// non-UTF-8 bytes are rejected too.
pub fn extract_subject(raw_path: &str) -> Result<String, BadPath> {
    let bad_path = || BadPath {
        path: raw_path.to_string(),
    };

    let decoded = percent_decode(raw_path).ok_or_else(bad_path)?;
    match_subject(&decoded)
        .map(str::to_string)
        .ok_or_else(bad_path)
}

/// Percent-decode `raw` into UTF-8.
///
/// Returns `None` when a `%` is not followed by two hex digits or the decoded
/// bytes are not UTF-8.
pub fn percent_decode(raw: &str) -> Option<Cow<'_, str>> {
    if !escapes_well_formed(raw) {
        return None;
    }
    urlencoding::decode(raw).ok()
}

fn escapes_well_formed(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1..i + 3) {
            Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => i += 3,
            _ => return false,
        }
    }
    true
}

fn match_subject(path: &str) -> Option<&str> {
    let segment = path.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    Some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_ticket_path() {
        assert_eq!(extract_subject("/user/iamtheuser/ticket").unwrap(), "iamtheuser");
        assert_eq!(extract_subject("/user/a/ticket").unwrap(), "a");
    }

    #[test]
    fn test_subject_may_contain_special_characters() {
        assert_eq!(
            extract_subject("/user/jane.doe@example.com/ticket").unwrap(),
            "jane.doe@example.com"
        );
        assert_eq!(extract_subject("/user/ticket/ticket").unwrap(), "ticket");
        assert_eq!(extract_subject("/user/user/ticket").unwrap(), "user");
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(extract_subject("/user/jane%20doe/ticket").unwrap(), "jane doe");
        assert_eq!(extract_subject("/user/caf%C3%A9/ticket").unwrap(), "café");
        assert_eq!(extract_subject("/user/a+b/ticket").unwrap(), "a+b");
    }

    #[test]
    fn test_encoded_slash_rejected() {
        assert!(extract_subject("/user/a%2Fb/ticket").is_err());
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(extract_subject("/user/%FF/ticket").is_err());
    }

    #[test]
    fn test_malformed_escape_rejected() {
        for path in [
            "/user/a%ZZ/ticket",
            "/user/a%2/ticket",
            "/user/a%/ticket",
            "/user/a/ticket%",
            "/user/%G0/ticket",
        ] {
            assert!(extract_subject(path).is_err(), "accepted {:?}", path);
        }
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b").as_deref(), Some("a b"));
        assert_eq!(percent_decode("%e2%9c%93").as_deref(), Some("\u{2713}"));
        assert_eq!(percent_decode("no-escapes").as_deref(), Some("no-escapes"));
        assert_eq!(percent_decode("100%25").as_deref(), Some("100%"));
        assert_eq!(percent_decode("%ZZ"), None);
        assert_eq!(percent_decode("%F"), None);
        assert_eq!(percent_decode("%FF"), None);
    }

    #[test]
    fn test_rejects_other_paths() {
        for path in [
            "/",
            "",
            "/foo",
            "/user",
            "/user/",
            "/user/ticket",
            "/user//ticket",
            "/user/a/b/ticket",
            "/user/a/ticket/",
            "/user/a/ticket/extra",
            "/user/a/tickets",
            "/users/a/ticket",
            "/api/user/a/ticket",
            "user/a/ticket",
            "/USER/a/ticket",
            "/user/a/TICKET",
            "/user/a/token",
        ] {
            assert!(extract_subject(path).is_err(), "accepted {:?}", path);
        }
    }

    #[test]
    fn test_bad_path_keeps_raw_path() {
        let err = extract_subject("/foo%20bar").unwrap_err();
        assert_eq!(err.path, "/foo%20bar");
    }
}
