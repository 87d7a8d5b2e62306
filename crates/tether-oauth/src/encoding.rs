//! RFC 5849 percent-encoding and parameter normalization.
//!
//! Everything that goes into a signature base string passes through
//! [`oauth_encode`]; [`normalize_parameters`] produces the sorted
//! parameter string of RFC 5849 Section 3.4.1.3.2.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// OAuth unreserved characters: A-Z a-z 0-9 - . _ ~
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode string per RFC 5849 Section 3.6.
///
/// Every byte outside the unreserved set, including each byte of a
/// multi-byte UTF-8 sequence, becomes an uppercase `%XX` triple.
pub fn oauth_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Decode `%XX` triples; invalid UTF-8 is replaced lossily.
pub fn oauth_decode(input: &str) -> Cow<'_, str> {
    percent_decode_str(input).decode_utf8_lossy()
}

/// Build the normalized parameter string.
///
/// Keys and values are encoded first, then pairs are sorted by encoded
/// key and, for repeated keys, by encoded value. Empty values render as
/// `key=`. Input order does not affect the output.
pub fn normalize_parameters<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (oauth_encode(k.as_ref()), oauth_encode(v.as_ref())))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_oauth_encode_unreserved() {
        assert_eq!(oauth_encode("abc123"), "abc123");
        assert_eq!(oauth_encode("ABC"), "ABC");
        assert_eq!(oauth_encode("-._~"), "-._~");
    }

    #[test]
    fn test_oauth_encode_reserved() {
        assert_eq!(oauth_encode(" "), "%20");
        assert_eq!(oauth_encode("&"), "%26");
        assert_eq!(oauth_encode("="), "%3D");
        assert_eq!(oauth_encode("/"), "%2F");
        assert_eq!(oauth_encode("+"), "%2B");
        assert_eq!(oauth_encode("*"), "%2A");
    }

    #[test]
    fn test_oauth_encode_multibyte_uppercase_hex() {
        assert_eq!(oauth_encode("é"), "%C3%A9");
        assert_eq!(oauth_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_encode_is_stable_through_decode() {
        for input in ["Ladies + Gentlemen", "a=b&c", "日本語", "100%", "", "~ok~"] {
            let encoded = oauth_encode(input);
            assert_eq!(oauth_encode(&oauth_decode(&encoded)), encoded);
            assert!(is_wellformed(&encoded), "{encoded}");
        }
    }

    fn is_wellformed(encoded: &str) -> bool {
        let bytes = encoded.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'%' {
                let hex = &bytes[i + 1..i + 3];
                if !hex.iter().all(|h| h.is_ascii_digit() || (b'A'..=b'F').contains(h)) {
                    return false;
                }
                i += 3;
            } else if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
                i += 1;
            } else {
                return false;
            }
        }
        true
    }

    #[test]
    fn test_normalize_rfc5849_example() {
        // RFC 5849 Section 3.4.1.3.2
        let params = [
            ("b5", "=%3D"),
            ("a3", "a"),
            ("c@", ""),
            ("a2", "r b"),
            ("oauth_consumer_key", "9djdj82h48djs9d2"),
            ("oauth_token", "kkk9d7dh3k39sjv7"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "137131201"),
            ("oauth_nonce", "7d8f3e4a"),
            ("c2", ""),
            ("a3", "2 q"),
        ];

        assert_eq!(
            normalize_parameters(&params),
            "a2=r%20b&a3=2%20q&a3=a&b5=%3D%253D&c%40=&c2=&oauth_consumer_key=9djdj82h48djs9d2\
             &oauth_nonce=7d8f3e4a&oauth_signature_method=HMAC-SHA1&oauth_timestamp=137131201\
             &oauth_token=kkk9d7dh3k39sjv7"
        );
    }

    #[test]
    fn test_normalize_keeps_empty_values_and_duplicates() {
        let params = [("b", ""), ("a", "2"), ("a", "1")];
        assert_eq!(normalize_parameters(&params), "a=1&a=2&b=");
    }

    #[test]
    fn test_normalize_order_independent() {
        let forward = [("x", "1"), ("y", "z z"), ("x", "0")];
        let mut reversed = forward;
        reversed.reverse();

        assert_eq!(
            normalize_parameters(&forward),
            normalize_parameters(&reversed)
        );
        assert_eq!(
            normalize_parameters(&forward),
            normalize_parameters(&forward)
        );
    }

    #[test]
    fn test_normalize_sorts_on_encoded_form() {
        let params = [("A", "1"), ("%", "2")];
        assert_eq!(normalize_parameters(&params), "%25=2&A=1");
    }
}
