//! The signed-request sender.
//!
//! [`RequestSender`] wraps an [`HttpTransport`] and drives one exchange at a
//! time: sign the request, send it, then verify the response signature
//! against the request that caused it. In strict mode an unsigned response
//! is an error; otherwise it is reported via [`Exchange::unsigned`].

use std::collections::BTreeMap;
use std::fmt;

use authkey_core::{AuthConfig, AuthContext, Credentials};
use tracing::debug;

use crate::transport::{HttpTransport, TransportRequest};

/// A failed exchange, classified by where it went wrong.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    /// Local fault: bad credentials, malformed url, transport failure.
    #[error("InternalError: {0}")]
    Internal(String),
    /// The server rejected the request.
    #[error("RequestError: {0}")]
    Request(String),
    /// The response failed verification.
    #[error("ResponseError: {0}")]
    Response(String),
}

/// Sender configuration.
#[derive(Debug, Clone, Default)]
pub struct SenderOptions {
    /// Require every response to be signed.
    pub strict: bool,
    /// Protocol configuration, shared with the server.
    pub auth: AuthConfig,
    /// Plain headers added to every request (after the signed ones).
    pub headers: Vec<(String, String)>,
    /// X-headers signed into every request.
    pub xheaders: Vec<(String, String)>,
}

/// A completed, verified exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// HTTP status code.
    pub status: u16,
    /// Raw response header pairs.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
    /// X-headers extracted from a signed response, keyed without the prefix.
    pub xheaders: BTreeMap<String, String>,
    /// Whether the response arrived unsigned (never true in strict mode).
    pub unsigned: bool,
}

/// Signs requests for one account and verifies the responses.
pub struct RequestSender<T> {
    account: Credentials,
    options: SenderOptions,
    transport: T,
}

impl<T> fmt::Debug for RequestSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSender")
            .field("account_id", &self.account.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T: HttpTransport> RequestSender<T> {
    /// Create a sender for an account over the given transport.
    pub fn new(account: Credentials, options: SenderOptions, transport: T) -> Self {
        Self {
            account,
            options,
            transport,
        }
    }

    /// Add a plain header to every subsequent request.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.options.headers.push((name.into(), value.into()));
    }

    /// Add an x-header to be signed into every subsequent request.
    pub fn set_xheader(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.options.xheaders.push((name.into(), value.into()));
    }

    /// Require (or stop requiring) signed responses.
    pub fn set_strict_mode(&mut self, strict: bool) {
        self.options.strict = strict;
    }

    /// Sign and send one request, then verify the response.
    ///
    /// # Errors
    ///
    /// [`SendError::Internal`] for local and transport faults,
    /// [`SendError::Request`] for a non-200 status,
    /// [`SendError::Response`] when response verification fails.
    pub fn send(&mut self, method: &str, url: &str, body: &[u8]) -> Result<Exchange, SendError> {
        let ctx = AuthContext::for_request(
            self.options.auth.clone(),
            &self.account,
            method,
            url,
            &self.options.xheaders,
        )
        .map_err(|err| SendError::Internal(err.message))?;

        let mut headers = ctx.header_lines();
        headers.extend(self.options.headers.iter().cloned());

        debug!(
            method = %ctx.method(),
            url,
            request_id = %ctx.request_id(),
            "sending signed request"
        );

        let response = self
            .transport
            .execute(TransportRequest {
                method: ctx.method(),
                url,
                headers: &headers,
                body,
            })
            .map_err(|err| SendError::Internal(format!("Failed to open {url}: {err}")))?;

        if response.status != 200 {
            return Err(SendError::Request(format!(
                "Unexpected status code {}",
                response.status
            )));
        }

        let parsed = ctx
            .from_response(&response.headers, !self.options.strict)
            .map_err(|err| SendError::Response(err.to_string()))?;

        let (xheaders, unsigned) = match parsed {
            Some(signed) => {
                signed
                    .check(&[], &self.account.key, 0)
                    .map_err(|err| SendError::Response(err.to_string()))?;
                (signed.all_xheaders(false), false)
            }
            None => (BTreeMap::new(), true),
        };

        Ok(Exchange {
            status: response.status,
            headers: response.headers,
            body: response.body,
            xheaders,
            unsigned,
        })
    }
}
