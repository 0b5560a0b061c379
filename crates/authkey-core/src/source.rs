//! The inbound-request collaborator seam.
//!
//! The protocol core never reads a socket. The host hands it a
//! [`RequestSource`]: a CGI-style variable map where `REQUEST_METHOD`,
//! `REQUEST_URI` (the request path, without the query string) and
//! `QUERY_STRING` describe the request line, and every header appears as
//! `HTTP_<NAME>` with the name upper-cased and hyphens mapped to
//! underscores.

use std::collections::BTreeMap;

use crate::config::cgi_name;

/// Read access to the host's request variables, CGI style.
pub trait RequestSource {
    /// Value of a single request variable.
    fn var(&self, name: &str) -> Option<&str>;

    /// Names of all request variables present.
    fn var_names(&self) -> Vec<String>;
}

/// A map-backed [`RequestSource`], built from a CGI environment or a parsed
/// HTTP request.
///
/// # Examples
///
/// ```
/// use authkey_core::{CgiRequest, RequestSource};
///
/// let source = CgiRequest::from_parts(
///     "GET",
///     "/api",
///     "a=1",
///     &[("X-Mac-Username".to_owned(), "fred".to_owned())],
/// );
/// assert_eq!(source.var("REQUEST_METHOD"), Some("GET"));
/// assert_eq!(source.var("HTTP_X_MAC_USERNAME"), Some("fred"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CgiRequest {
    vars: BTreeMap<String, String>,
}

impl CgiRequest {
    /// Create an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Build a request from the request line plus wire-format header pairs.
    ///
    /// Header names are converted to their `HTTP_` variable form.
    #[must_use]
    pub fn from_parts(method: &str, path: &str, query: &str, headers: &[(String, String)]) -> Self {
        let mut source = Self::new();
        source.set("REQUEST_METHOD", method);
        source.set("REQUEST_URI", path);
        source.set("QUERY_STRING", query);
        for (name, value) in headers {
            source.set(cgi_name(name), value.clone());
        }
        source
    }
}

impl RequestSource for CgiRequest {
    fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    fn var_names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}
