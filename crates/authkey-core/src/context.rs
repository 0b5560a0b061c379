//! The per-operation signing and verification context.
//!
//! An [`AuthContext`] is built once per message and never mutated afterwards:
//! `for_request`/`for_response` produce a sealed outbound context,
//! `from_request`/`from_response` parse an inbound one. Verification is a
//! separate, read-only [`check`](AuthContext::check) call, so a context can
//! be inspected (account id, x-headers) before the shared key is known.
//!
//! The shared secret is never stored on the context; it is borrowed for the
//! duration of a signing or verification call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::canonical;
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult, ErrorCode};
use crate::request_id;
use crate::sign;
use crate::source::RequestSource;

/// A client account: the public id travels on the wire, the key never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Public account identifier.
    pub id: String,
    /// Shared secret.
    pub key: String,
}

impl Credentials {
    /// Create credentials from an id and a shared key.
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }

    fn validate(&self) -> AuthResult<()> {
        if self.id.is_empty() || self.key.is_empty() {
            return Err(AuthError::internal("Account details missing."));
        }
        Ok(())
    }
}

/// A sealed (outbound) or parsed (inbound) signing context.
#[derive(Debug, Clone)]
pub struct AuthContext {
    config: AuthConfig,
    prefix: String,
    method: String,
    path: String,
    query: String,
    timestamp: i64,
    account_id: String,
    request_id: String,
    signature: String,
    auth_header: String,
    xheaders: BTreeMap<String, String>,
}

impl AuthContext {
    fn empty(config: AuthConfig) -> Self {
        let prefix = config.prefix();
        Self {
            config,
            prefix,
            method: String::new(),
            path: String::new(),
            query: String::new(),
            timestamp: 0,
            account_id: String::new(),
            request_id: String::new(),
            signature: String::new(),
            auth_header: String::new(),
            xheaders: BTreeMap::new(),
        }
    }

    /// Build and seal a signed outbound request.
    ///
    /// `url` must be absolute (scheme and host); only its path and query are
    /// signed. `xheaders` names may be bare (`username`) or already prefixed
    /// (`x-mac-username`).
    ///
    /// # Errors
    ///
    /// [`ErrorCode::InternalError`] if the credentials are incomplete or the
    /// url is not absolute.
    pub fn for_request(
        config: AuthConfig,
        credentials: &Credentials,
        method: &str,
        url: &str,
        xheaders: &[(String, String)],
    ) -> AuthResult<Self> {
        credentials.validate()?;

        let mut ctx = Self::empty(config);
        ctx.method = method.to_uppercase();
        (ctx.path, ctx.query) = split_url(url)?;
        ctx.request_id = request_id::generate();
        ctx.account_id.clone_from(&credentials.id);

        for (key, value) in xheaders {
            ctx.store_xheader(key, value, None);
        }

        ctx.seal(&credentials.key);
        Ok(ctx)
    }

    /// Build and seal a signed response to the request this context
    /// represents.
    ///
    /// The response reuses the request id, which is what binds the response
    /// signature to the original request. Method, path and query are not part
    /// of a response signature.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::InternalError`] if this context has no request id or the
    /// credentials are incomplete.
    pub fn for_response(
        &self,
        credentials: &Credentials,
        xheaders: &[(String, String)],
    ) -> AuthResult<Self> {
        if self.request_id.is_empty() {
            return Err(AuthError::internal(
                "Cannot sign a response without a request id",
            ));
        }
        credentials.validate()?;

        let mut ctx = Self::empty(self.config.clone());
        ctx.request_id.clone_from(&self.request_id);
        ctx.account_id.clone_from(&credentials.id);

        for (key, value) in xheaders {
            ctx.store_xheader(key, value, None);
        }

        ctx.seal(&credentials.key);
        Ok(ctx)
    }

    /// Parse a signed inbound request from the host's request variables.
    ///
    /// Returns `Ok(None)` when the auth header is absent or malformed and
    /// `optional` is true: a public request proceeds anonymously either way.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::MissingSecurityHeader`] when the header is absent and
    /// required, [`ErrorCode::InvalidHeader`] when it is malformed and
    /// required.
    pub fn from_request(
        config: AuthConfig,
        source: &dyn RequestSource,
        optional: bool,
    ) -> AuthResult<Option<Self>> {
        let mut ctx = Self::empty(config);

        let Some(raw) = source.var(&ctx.config.cgi_header_name()) else {
            if optional {
                return Ok(None);
            }
            return Err(ctx.missing_header_error());
        };
        if let Err(err) = ctx.parse_auth_value(&raw.to_owned(), true) {
            if optional {
                return Ok(None);
            }
            return Err(err);
        }

        ctx.method = source.var("REQUEST_METHOD").unwrap_or_default().to_owned();
        ctx.path = source.var("REQUEST_URI").unwrap_or_default().to_owned();
        ctx.query = source.var("QUERY_STRING").unwrap_or_default().to_owned();

        let cgi_prefix = ctx.config.cgi_prefix();
        for name in source.var_names() {
            if has_prefix_ci(&name, &cgi_prefix) {
                if let Some(value) = source.var(&name) {
                    let value = value.to_owned();
                    ctx.store_xheader(&name, &value, Some(&cgi_prefix));
                }
            }
        }

        Ok(Some(ctx))
    }

    /// Parse a signed response to the request this context represents.
    ///
    /// The returned context keeps this context's request id rather than
    /// adopting the one in the response header, so a response signed for a
    /// different request fails its signature check.
    ///
    /// Returns `Ok(None)` when no auth header is present and `optional` is
    /// true (an unsigned response).
    ///
    /// # Errors
    ///
    /// [`ErrorCode::MissingSecurityHeader`] when the header is absent and
    /// required, [`ErrorCode::InvalidHeader`] when it is malformed.
    pub fn from_response(
        &self,
        headers: &[(String, String)],
        optional: bool,
    ) -> AuthResult<Option<Self>> {
        let mut ctx = Self::empty(self.config.clone());
        ctx.request_id.clone_from(&self.request_id);

        let name = ctx.config.header_name().to_owned();
        let Some(raw) = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
            .map(|(_, value)| value.clone())
        else {
            if optional {
                return Ok(None);
            }
            return Err(ctx.missing_header_error());
        };
        ctx.parse_auth_value(&raw, false)?;

        let prefix = ctx.prefix.clone();
        for (key, value) in headers {
            if has_prefix_ci(key, &prefix) {
                ctx.store_xheader(key, value, None);
            }
        }

        Ok(Some(ctx))
    }

    /// Check a parsed context: required x-headers, replay window, signature.
    ///
    /// `interval` is the replay window in seconds; `0` means use the
    /// configured window. Checks short-circuit in order, so the reported
    /// error is always the first failure.
    ///
    /// # Errors
    ///
    /// [`ErrorCode::MissingSecurityHeader`], [`ErrorCode::RequestTimeTooSkewed`]
    /// or [`ErrorCode::SignatureDoesNotMatch`] on the first failing check;
    /// [`ErrorCode::InternalError`] if this context was never parsed or sealed.
    pub fn check(&self, required: &[&str], account_key: &str, interval: u64) -> AuthResult<()> {
        if self.auth_header.is_empty() {
            return Err(AuthError::internal("Cannot check empty auth header"));
        }
        self.check_required(required)?;
        self.check_time_at(interval, Utc::now().timestamp())?;
        self.check_signature(account_key)
    }

    /// Header lines for the sealed message: the auth header first, then the
    /// x-headers in sorted order.
    #[must_use]
    pub fn header_lines(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.xheaders.len() + 1);
        out.push((
            self.config.header_name().to_owned(),
            self.auth_header.clone(),
        ));
        for (key, value) in &self.xheaders {
            out.push((key.clone(), value.clone()));
        }
        out
    }

    /// An x-header value by bare or prefixed name, unfolded.
    #[must_use]
    pub fn xheader(&self, name: &str) -> Option<String> {
        let key = if has_prefix_ci(name, &self.prefix) {
            name.to_lowercase()
        } else {
            format!("{}{}", self.prefix, name).to_lowercase()
        };
        self.xheaders.get(&key).map(|value| canonical::unfold(value))
    }

    /// All x-headers, keyed with or without the prefix.
    #[must_use]
    pub fn all_xheaders(&self, prefixed: bool) -> BTreeMap<String, String> {
        self.xheaders
            .iter()
            .map(|(key, value)| {
                let key = if prefixed {
                    key.clone()
                } else {
                    key.get(self.prefix.len()..).unwrap_or_default().to_owned()
                };
                (key, value.clone())
            })
            .collect()
    }

    /// The account id carried in the auth header.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// The request id this context signs or verifies against.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The signing timestamp (seconds since the Unix epoch).
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// The raw auth header value.
    #[must_use]
    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    /// The request method (empty for responses).
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request path (empty for responses).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request query string (empty for responses).
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The protocol configuration this context was built with.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn seal(&mut self, account_key: &str) {
        self.timestamp = Utc::now().timestamp();

        let canonical = self.string_to_sign();
        let key = sign::derive_signing_key(account_key, self.timestamp);
        self.signature = sign::sign(&canonical, &key);
        self.auth_header = format!(
            "{} {}:{}:{}:{}",
            self.config.scheme(),
            self.timestamp,
            self.account_id,
            self.request_id,
            self.signature,
        );

        debug!(
            account_id = %self.account_id,
            request_id = %self.request_id,
            timestamp = self.timestamp,
            xheaders = self.xheaders.len(),
            "sealed auth context"
        );
    }

    fn string_to_sign(&self) -> String {
        canonical::string_to_sign(
            &self.method,
            &self.path,
            &self.query,
            &self.xheaders,
            self.config.scheme(),
            self.timestamp,
            &self.request_id,
        )
    }

    /// Parse `<scheme> <ts>:<accountId>:<requestId>:<signature>`.
    ///
    /// For requests the parsed request id becomes this context's id; for
    /// responses the id parsed off the wire is ignored in favor of the id
    /// already held, which is what enforces request/response binding.
    fn parse_auth_value(&mut self, raw: &str, is_request: bool) -> AuthResult<()> {
        let raw = raw.trim();
        self.auth_header = raw.to_owned();

        let scheme = self.config.scheme();
        let Some(rest) = raw.strip_prefix(&format!("{scheme} ")) else {
            return Err(self.malformed_error(&format!("malformed, missing scheme: {scheme}")));
        };

        let parts: Vec<&str> = rest.trim_start().split(':').collect();
        if parts.len() != 4 {
            return Err(self.malformed_error("malformed: not enough elements"));
        }

        let labels = ["Timestamp", "AccountId", "RequestId", "Signature"];
        for (part, label) in parts.iter().zip(labels) {
            if part.is_empty() {
                return Err(self.malformed_error(&format!("malformed: {label} is missing")));
            }
        }

        let Ok(timestamp) = parts[0].parse::<i64>() else {
            return Err(self.malformed_error("malformed: Timestamp is invalid"));
        };

        self.timestamp = timestamp;
        self.account_id = parts[1].to_owned();
        if is_request {
            self.request_id = parts[2].to_owned();
        }
        self.signature = parts[3].to_owned();

        Ok(())
    }

    fn check_required(&self, required: &[&str]) -> AuthResult<()> {
        for name in required {
            if self.xheader(name).is_none() {
                return Err(AuthError::new(
                    ErrorCode::MissingSecurityHeader,
                    format!("Required x-header is missing: {name}"),
                ));
            }
        }
        Ok(())
    }

    fn check_time_at(&self, interval: u64, now: i64) -> AuthResult<()> {
        let interval = if interval == 0 {
            self.config.interval()
        } else {
            interval
        };

        if now.abs_diff(self.timestamp) > interval {
            let host_time = DateTime::<Utc>::from_timestamp(now, 0)
                .map(|time| time.to_rfc2822())
                .unwrap_or_default();
            return Err(AuthError::new(
                ErrorCode::RequestTimeTooSkewed,
                format!("Time too skewed. Host time is: {host_time}"),
            ));
        }

        Ok(())
    }

    fn check_signature(&self, account_key: &str) -> AuthResult<()> {
        let canonical = self.string_to_sign();
        let key = sign::derive_signing_key(account_key, self.timestamp);

        if sign::verify(&canonical, &key, &self.signature) {
            Ok(())
        } else {
            Err(AuthError::new(
                ErrorCode::SignatureDoesNotMatch,
                "Signature does not match",
            ))
        }
    }

    /// Store an x-header under its normalized key.
    ///
    /// `strip` is the inbound prefix to remove (the CGI variable prefix for
    /// requests); the stored key always carries the wire prefix. CGI names
    /// map underscores back to hyphens, caller-supplied names map any
    /// non-alphanumeric run of characters to hyphens. Empty names and empty
    /// trimmed values are dropped.
    fn store_xheader(&mut self, key: &str, value: &str, strip: Option<&str>) {
        let strip = strip.unwrap_or(&self.prefix);
        let bare = if has_prefix_ci(key, strip) {
            key.get(strip.len()..).unwrap_or_default()
        } else {
            key
        };

        let cleaned: String = if strip.starts_with("HTTP") {
            bare.replace('_', "-")
        } else {
            bare.chars()
                .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
                .collect()
        };

        let value = value.trim();
        if cleaned.is_empty() || value.is_empty() {
            return;
        }

        self.xheaders
            .insert(format!("{}{cleaned}", self.prefix).to_lowercase(), value.to_owned());
    }

    fn missing_header_error(&self) -> AuthError {
        AuthError::new(
            ErrorCode::MissingSecurityHeader,
            format!("{} header is missing", self.config.header_name()),
        )
    }

    fn malformed_error(&self, detail: &str) -> AuthError {
        AuthError::new(
            ErrorCode::InvalidHeader,
            format!("{} header {detail}", self.config.header_name()),
        )
    }
}

/// Case-insensitive ASCII prefix test.
fn has_prefix_ci(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Split an absolute url into its path and query.
fn split_url(url: &str) -> AuthResult<(String, String)> {
    let malformed = || AuthError::internal(format!("Malformed url: {url}"));

    let uri: http::Uri = url.parse().map_err(|_| malformed())?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(malformed());
    }

    Ok((
        uri.path().to_owned(),
        uri.query().unwrap_or_default().to_owned(),
    ))
}
