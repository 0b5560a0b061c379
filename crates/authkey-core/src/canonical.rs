//! Canonical string-to-sign construction.
//!
//! The string fed into the HMAC is a newline-joined sequence:
//!
//! ```text
//! HTTPMethod\n
//! Path\n
//! QueryString\n
//! x-header:value\n        (one line per extension header, sorted)
//! Scheme\n
//! Timestamp\n
//! RequestId
//! ```
//!
//! Extension header values are "unfolded" (runs of whitespace collapsed to a
//! single space) and the `key:value` lines are sorted lexicographically, so
//! the result is byte-identical regardless of the order headers were
//! supplied. This determinism is what makes independently written client and
//! server implementations interoperate.

use std::collections::BTreeMap;

/// Build the string to sign from the request metadata.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use authkey_core::canonical::string_to_sign;
///
/// let mut xheaders = BTreeMap::new();
/// xheaders.insert("x-mac-username".to_owned(), "fred".to_owned());
///
/// let canonical = string_to_sign("GET", "/api", "", &xheaders, "MAC", 1700000000, "req-1");
/// assert_eq!(canonical, "GET\n/api\n\nx-mac-username:fred\nMAC\n1700000000\nreq-1");
/// ```
#[must_use]
pub fn string_to_sign(
    method: &str,
    path: &str,
    query: &str,
    xheaders: &BTreeMap<String, String>,
    scheme: &str,
    timestamp: i64,
    request_id: &str,
) -> String {
    let mut subject: Vec<String> = Vec::with_capacity(xheaders.len() + 6);
    subject.push(method.to_uppercase());
    subject.push(path.to_owned());
    subject.push(query.to_owned());

    let mut formatted: Vec<String> = xheaders
        .iter()
        .map(|(key, value)| format!("{key}:{}", unfold(value)))
        .collect();
    formatted.sort_unstable();
    subject.extend(formatted);

    subject.push(scheme.to_owned());
    subject.push(timestamp.to_string());
    subject.push(request_id.to_owned());

    subject.join("\n")
}

/// Unfold a header value: collapse runs of ASCII whitespace (spaces, tabs,
/// carriage returns, newlines) to a single space.
///
/// Only ASCII whitespace folds; non-ASCII whitespace is payload and passes
/// through untouched, so both peers canonicalize it byte-identically.
#[must_use]
pub fn unfold(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut prev_was_space = false;
    for ch in value.chars() {
        if ch.is_ascii_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
