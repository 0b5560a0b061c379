//! Signed-request client for the AuthKey protocol.
//!
//! The client signs every outbound request with an account's shared key and
//! verifies that the response it gets back was signed by the server for that
//! exact request. The HTTP stack itself is pluggable through the
//! [`HttpTransport`] trait.
//!
//! ```no_run
//! use authkey_client::{HttpTransport, RequestSender, SenderOptions};
//! use authkey_core::Credentials;
//!
//! fn run(transport: impl HttpTransport) -> Result<(), authkey_client::SendError> {
//!     let account = Credentials::new("example-id", "secret");
//!     let mut sender = RequestSender::new(account, SenderOptions::default(), transport);
//!     sender.set_xheader("username", "fred");
//!
//!     let exchange = sender.send("POST", "http://api.example.com/api", b"payload")?;
//!     println!("{} bytes, unsigned: {}", exchange.body.len(), exchange.unsigned);
//!     Ok(())
//! }
//! ```

pub mod sender;
pub mod transport;

pub use sender::{Exchange, RequestSender, SendError, SenderOptions};
pub use transport::{HttpTransport, TransportError, TransportRequest, TransportResponse};
