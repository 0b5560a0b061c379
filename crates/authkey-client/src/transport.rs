//! The HTTP transport seam.
//!
//! The sender owns signing and verification but delegates the actual HTTP
//! exchange to an [`HttpTransport`] implementation, so it can run over any
//! HTTP stack (or an in-process loopback in tests).

/// An outbound request, fully prepared: signed headers included.
#[derive(Debug, Clone, Copy)]
pub struct TransportRequest<'a> {
    /// Upper-cased HTTP method.
    pub method: &'a str,
    /// Absolute request url.
    pub url: &'a str,
    /// Header pairs in send order; the auth header comes first.
    pub headers: &'a [(String, String)],
    /// Request body.
    pub body: &'a [u8],
}

/// The raw result of an HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response header pairs.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

/// A transport-level failure: connection refused, timeout, TLS fault.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Performs a single HTTP exchange.
pub trait HttpTransport {
    /// Execute the request and return the raw response.
    ///
    /// # Errors
    ///
    /// [`TransportError`] when no HTTP response was obtained at all; an HTTP
    /// error status is a normal [`TransportResponse`].
    fn execute(&mut self, request: TransportRequest<'_>) -> Result<TransportResponse, TransportError>;
}
