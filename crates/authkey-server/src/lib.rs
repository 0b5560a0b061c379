//! Server-side request verification for the AuthKey protocol.
//!
//! The server half of the protocol: parse the signed request the host hands
//! over as a [`RequestSource`](authkey_core::RequestSource), look the account
//! up through an [`Authorizer`], verify the signature and replay window, and
//! form (optionally signed) replies.
//!
//! ```
//! use authkey_core::{AuthContext, CgiRequest};
//! use authkey_server::{Authorization, Denial, HandlerOptions, Outcome, RequestHandler};
//!
//! let authorizer = |request: Option<&AuthContext>| match request {
//!     Some(ctx) if ctx.account_id() == "example-id" => Authorization::Authorized {
//!         account_key: "secret".to_owned(),
//!     },
//!     _ => Authorization::Denied(Denial::default()),
//! };
//!
//! let mut handler = RequestHandler::new(authorizer, HandlerOptions::default());
//! let source = CgiRequest::from_parts("GET", "/api", "", &[]);
//!
//! match handler.receive(&source).unwrap() {
//!     Outcome::Reply(reply) => assert_eq!(reply.status, 400), // no auth header
//!     Outcome::Proceed => unreachable!(),
//! }
//! ```

pub mod authorize;
pub mod handler;
pub mod lifecycle;
pub mod reply;

pub use authorize::{Authorization, Authorizer, Denial};
pub use handler::{HandlerOptions, Outcome, RequestHandler};
pub use lifecycle::{HandlerFault, Stage};
pub use reply::{Reply, ReplyError};
