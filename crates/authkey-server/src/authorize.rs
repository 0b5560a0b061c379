//! The account-lookup seam.
//!
//! The handler knows the claimed account id but not whether it exists or
//! what its key is; that lookup belongs to the host. An [`Authorizer`]
//! answers with either the account's shared key or a denial that becomes
//! the HTTP reply.

use authkey_core::AuthContext;
use serde_json::{Map, Value};

/// The authorizer's verdict on a claimed account.
#[derive(Debug, Clone)]
pub enum Authorization {
    /// The account exists; verification proceeds with this shared key.
    ///
    /// An empty key authorizes an unsigned (public) request: signature
    /// verification is skipped.
    Authorized {
        /// The account's shared secret.
        account_key: String,
    },
    /// The account is refused; the denial becomes the reply.
    Denied(Denial),
}

/// A refusal, carrying everything needed to form the error reply.
#[derive(Debug, Clone)]
pub struct Denial {
    /// HTTP status for the reply.
    pub status: u16,
    /// Error code placed in the JSON body.
    pub code: String,
    /// Error message placed in the JSON body.
    pub message: String,
    /// Additional key-value detail merged into the JSON body.
    pub extra: Map<String, Value>,
}

impl Default for Denial {
    fn default() -> Self {
        Self {
            status: 403,
            code: "InvalidAccountId".to_owned(),
            message: "The AccountId you provided does not exist in our records".to_owned(),
            extra: Map::new(),
        }
    }
}

/// Resolves a claimed account to its shared key.
pub trait Authorizer {
    /// Judge the request; `request` is `None` for an unsigned public request.
    fn authorize(&self, request: Option<&AuthContext>) -> Authorization;
}

impl<F> Authorizer for F
where
    F: Fn(Option<&AuthContext>) -> Authorization,
{
    fn authorize(&self, request: Option<&AuthContext>) -> Authorization {
        self(request)
    }
}
