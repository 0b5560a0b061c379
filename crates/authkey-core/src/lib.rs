//! Symmetric-key request/response signing for AuthKey.
//!
//! This crate implements the protocol core shared by the AuthKey client and
//! server: canonical string construction, per-request signing key derivation,
//! HMAC-SHA256 signature computation/verification, and the [`AuthContext`]
//! that builds outbound auth headers and validates inbound ones.
//!
//! # Wire format
//!
//! A signed message carries a single auth header plus any number of
//! extension headers:
//!
//! ```text
//! Auth-Key: MAC <timestamp>:<accountId>:<requestId>:<signature>
//! x-mac-<name>: <value>
//! ```
//!
//! The signature is `Base64(HMAC-SHA256(canonical_string, signing_key))`
//! where `signing_key = SHA256(accountKey + timestamp)`. Both sides must
//! produce the canonical string byte-for-byte identically; see [`canonical`].
//!
//! # Usage
//!
//! ```
//! use authkey_core::{AuthConfig, AuthContext, Credentials};
//!
//! let account = Credentials::new("example-id", "secret");
//! let ctx = AuthContext::for_request(
//!     AuthConfig::default(),
//!     &account,
//!     "GET",
//!     "http://api.example.com/api",
//!     &[("username".to_owned(), "fred".to_owned())],
//! )
//! .unwrap();
//!
//! // The first header line is the auth header, the rest are x-headers.
//! let headers = ctx.header_lines();
//! assert_eq!(headers[0].0, "Auth-Key");
//! assert!(headers[0].1.starts_with("MAC "));
//! assert_eq!(headers[1], ("x-mac-username".to_owned(), "fred".to_owned()));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical string-to-sign construction
//! - [`config`] - Protocol configuration (header name, scheme, prefix, replay window)
//! - [`context`] - The per-operation signing/verification context
//! - [`error`] - Protocol error taxonomy and HTTP status mapping
//! - [`request_id`] - Per-request nonce generation
//! - [`sign`] - Signing key derivation and HMAC signature computation
//! - [`source`] - The inbound-request collaborator seam

pub mod canonical;
pub mod config;
pub mod context;
pub mod error;
pub mod request_id;
pub mod sign;
pub mod source;

pub use config::AuthConfig;
pub use context::{AuthContext, Credentials};
pub use error::{AuthError, AuthResult, ErrorCode};
pub use source::{CgiRequest, RequestSource};
