//! Reply formation: header deduplication and JSON error bodies.

use authkey_core::AuthError;
use serde_json::{Map, Value};

use crate::authorize::Denial;

/// A formed HTTP reply, ready for the host to write out.
///
/// `status == 0` means the first header line is a status or `Location`
/// line supplied by the caller, which controls the response instead.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    /// HTTP status code, or 0 when a caller status header takes over.
    pub status: u16,
    /// Raw header lines (`Name: value`) in send order.
    pub headers: Vec<String>,
    /// Response body.
    pub body: Vec<u8>,
}

/// Why a reply could not be formed normally.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReplyError {
    /// Unclassified server fault; replies with a bare 500.
    #[error("internal server error")]
    Internal,
    /// A bare status reply with no body.
    #[error("status {0}")]
    Status(u16),
    /// An authorizer denial.
    #[error("access denied: {}", .0.code)]
    Denied(Denial),
    /// A protocol verification failure.
    #[error(transparent)]
    Protocol(#[from] AuthError),
}

/// Deduplicate caller-supplied header lines.
///
/// Header names match case-insensitively, last value wins but the first
/// occurrence keeps its position. A status line (`HTTP/1.x`, `Status` or
/// `Location`) is pulled to the front, and its presence is signalled by a
/// returned status of 0 instead of 200.
#[must_use]
pub fn unique_headers(headers: &[String]) -> (u16, Vec<String>) {
    let mut status_line: Option<String> = None;
    let mut unique: Vec<(String, String)> = Vec::with_capacity(headers.len());

    for header in headers {
        let name = header.split(':').next().unwrap_or_default().trim();
        let lower = name.to_lowercase();

        if lower.starts_with("http/1") || lower.starts_with("status") || lower.starts_with("location")
        {
            status_line = Some(header.clone());
        } else if let Some(slot) = unique.iter_mut().find(|(key, _)| *key == lower) {
            slot.1.clone_from(header);
        } else {
            unique.push((lower, header.clone()));
        }
    }

    let status = if status_line.is_some() { 0 } else { 200 };
    let mut out = Vec::with_capacity(unique.len() + 1);
    out.extend(status_line);
    out.extend(unique.into_iter().map(|(_, header)| header));

    (status, out)
}

/// Form the JSON error body.
///
/// Empty code and message fall back to `AccessDenied` / `Access Denied`;
/// the request path and query are included when known, and `extra` pairs
/// are merged in last.
#[must_use]
pub fn error_body(
    code: &str,
    message: &str,
    resource: &str,
    query: &str,
    extra: &Map<String, Value>,
) -> Vec<u8> {
    let mut body = Map::new();

    let code = if code.is_empty() { "AccessDenied" } else { code };
    let message = if message.is_empty() {
        "Access Denied"
    } else {
        message
    };
    body.insert("code".to_owned(), Value::from(code));
    body.insert("message".to_owned(), Value::from(message));

    if !resource.is_empty() {
        body.insert("resource".to_owned(), Value::from(resource));
    }
    if !query.is_empty() {
        body.insert("query".to_owned(), Value::from(query));
    }

    for (key, value) in extra {
        body.insert(key.clone(), value.clone());
    }

    serde_json::to_vec(&Value::Object(body)).expect("JSON serialization of error cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn test_should_default_to_status_200_with_no_status_line() {
        let (status, headers) = unique_headers(&lines(&["Content-Type: text/plain"]));
        assert_eq!(status, 200);
        assert_eq!(headers, lines(&["Content-Type: text/plain"]));
    }

    #[test]
    fn test_should_move_status_line_first_and_zero_the_status() {
        let (status, headers) = unique_headers(&lines(&[
            "Content-Type: text/plain",
            "HTTP/1.1 409 Conflict",
        ]));
        assert_eq!(status, 0);
        assert_eq!(headers[0], "HTTP/1.1 409 Conflict");
        assert_eq!(headers[1], "Content-Type: text/plain");
    }

    #[test]
    fn test_should_treat_location_as_status_line() {
        let (status, headers) =
            unique_headers(&lines(&["Location: http://www.example.com/"]));
        assert_eq!(status, 0);
        assert_eq!(headers[0], "Location: http://www.example.com/");
    }

    #[test]
    fn test_should_dedup_headers_case_insensitively_last_wins() {
        let (_, headers) = unique_headers(&lines(&[
            "Content-Type: text/plain",
            "X-Other: 1",
            "content-type: application/json",
        ]));
        assert_eq!(
            headers,
            lines(&["content-type: application/json", "X-Other: 1"])
        );
    }

    #[test]
    fn test_should_build_error_body_with_defaults() {
        let body = error_body("", "", "", "", &Map::new());
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], "AccessDenied");
        assert_eq!(value["message"], "Access Denied");
        assert!(value.get("resource").is_none());
    }

    #[test]
    fn test_should_include_resource_query_and_extra() {
        let mut extra = Map::new();
        extra.insert("hint".to_owned(), Value::from("rotate your key"));

        let body = error_body(
            "SignatureDoesNotMatch",
            "Signature does not match",
            "/api",
            "a=1",
            &extra,
        );
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], "SignatureDoesNotMatch");
        assert_eq!(value["resource"], "/api");
        assert_eq!(value["query"], "a=1");
        assert_eq!(value["hint"], "rotate your key");
    }
}
