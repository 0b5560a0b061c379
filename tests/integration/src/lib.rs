//! Client/server integration tests for the AuthKey protocol.
//!
//! A [`Loopback`] transport hands each request straight to a fresh
//! [`RequestHandler`], so every exchange exercises the full path: sign,
//! serialize to CGI variables, parse, authorize, verify, reply, verify the
//! reply. No network is involved.

use std::collections::BTreeMap;
use std::sync::Once;

use authkey_client::{HttpTransport, TransportError, TransportRequest, TransportResponse};
use authkey_core::{AuthContext, CgiRequest, Credentials};
use authkey_server::{
    Authorization, Denial, HandlerOptions, Reply, RequestHandler,
};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// The shared key every test account uses.
pub const TEST_KEY: &str = "U7ZPJyFAX8Gr3Hm2DFrSQy3x1I3nLdNT2U1c+ToE5Vk=";

/// Credentials for the one account the loopback server knows.
#[must_use]
pub fn test_account() -> Credentials {
    init_tracing();
    Credentials::new("example-id", TEST_KEY)
}

/// An in-process server standing in for the HTTP stack.
///
/// Each executed request builds a fresh handler, runs the full lifecycle
/// and echoes `reply_body` on success.
#[derive(Debug, Clone)]
pub struct Loopback {
    /// Known accounts: id to shared key.
    pub accounts: BTreeMap<String, String>,
    /// Handler options for every request.
    pub options: HandlerOptions,
    /// Comma-separated required x-headers.
    pub required: String,
    /// Body returned for verified requests.
    pub reply_body: Vec<u8>,
}

impl Default for Loopback {
    fn default() -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert("example-id".to_owned(), TEST_KEY.to_owned());
        Self {
            accounts,
            options: HandlerOptions::default(),
            required: String::new(),
            reply_body: b"done".to_vec(),
        }
    }
}

impl HttpTransport for Loopback {
    fn execute(
        &mut self,
        request: TransportRequest<'_>,
    ) -> Result<TransportResponse, TransportError> {
        let uri: http::Uri = request
            .url
            .parse()
            .map_err(|_| TransportError(format!("bad url: {}", request.url)))?;
        let source = CgiRequest::from_parts(
            request.method,
            uri.path(),
            uri.query().unwrap_or_default(),
            request.headers,
        );

        let accounts = self.accounts.clone();
        let authorizer = move |request: Option<&AuthContext>| match request {
            Some(ctx) => accounts.get(ctx.account_id()).map_or_else(
                || Authorization::Denied(Denial::default()),
                |key| Authorization::Authorized {
                    account_key: key.clone(),
                },
            ),
            None => Authorization::Authorized {
                account_key: String::new(),
            },
        };

        let mut handler = RequestHandler::new(authorizer, self.options.clone());
        handler.set_required(&self.required);

        let body = self.reply_body.clone();
        let reply = handler
            .receive_with(&source, |server| server.reply(&body, &[]))
            .map_err(|fault| TransportError(fault.to_string()))?;

        Ok(reply_to_response(&reply))
    }
}

/// Convert a formed [`Reply`] back into a transport response.
#[must_use]
pub fn reply_to_response(reply: &Reply) -> TransportResponse {
    TransportResponse {
        status: if reply.status == 0 { 200 } else { reply.status },
        headers: reply
            .headers
            .iter()
            .filter_map(|line| line.split_once(": "))
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect(),
        body: reply.body.clone(),
    }
}

mod test_errors;
mod test_round_trip;
