//! The inbound-request handler.
//!
//! [`RequestHandler`] drives one request through the lifecycle: parse the
//! auth header ([`identify`](RequestHandler::identify)), resolve the account
//! key ([`authorize`](RequestHandler::authorize)), check the signature and
//! replay window ([`verify`](RequestHandler::verify)), then let the host
//! process the request and form the reply. Each step returns `Ok(Some(..))`
//! when a protocol failure has already been turned into the HTTP reply the
//! host should send; calling steps out of order is a [`HandlerFault`].

use std::fmt;

use authkey_core::{AuthConfig, AuthContext, Credentials, RequestSource};
use serde_json::Map;
use tracing::{debug, warn};

use crate::authorize::{Authorization, Authorizer};
use crate::lifecycle::{HandlerFault, Stage};
use crate::reply::{Reply, ReplyError, error_body, unique_headers};

/// Handler configuration.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    /// Allow unsigned requests to public resources.
    pub public: bool,
    /// Sign every reply, even without outbound x-headers.
    pub strict: bool,
    /// Protocol configuration, shared with the client.
    pub auth: AuthConfig,
    /// X-headers signed into every reply.
    pub xheaders: Vec<(String, String)>,
}

/// The result of running the full lifecycle.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A protocol failure or denial; send this reply.
    Reply(Reply),
    /// The request is verified; the host should process it.
    Proceed,
}

/// Verifies inbound requests for one endpoint.
pub struct RequestHandler<A> {
    authorizer: A,
    options: HandlerOptions,
    required: Vec<String>,
    stage: Stage,
    context: Option<AuthContext>,
    account_key: String,
}

impl<A> fmt::Debug for RequestHandler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("options", &self.options)
            .field("required", &self.required)
            .field("stage", &self.stage)
            .field(
                "account_id",
                &self.context.as_ref().map_or("", AuthContext::account_id),
            )
            .finish_non_exhaustive()
    }
}

impl<A: Authorizer> RequestHandler<A> {
    /// Create a handler with the given account lookup and options.
    pub fn new(authorizer: A, options: HandlerOptions) -> Self {
        Self {
            authorizer,
            options,
            required: Vec::new(),
            stage: Stage::Start,
            context: None,
            account_key: String::new(),
        }
    }

    /// Run the full lifecycle up to the processing step.
    ///
    /// # Errors
    ///
    /// [`HandlerFault`] if the handler has already advanced past the start.
    pub fn receive(&mut self, source: &dyn RequestSource) -> Result<Outcome, HandlerFault> {
        if let Some(reply) = self.identify(source)? {
            return Ok(Outcome::Reply(reply));
        }
        if let Some(reply) = self.authorize()? {
            return Ok(Outcome::Reply(reply));
        }
        if let Some(reply) = self.verify()? {
            return Ok(Outcome::Reply(reply));
        }
        Ok(Outcome::Proceed)
    }

    /// Run the full lifecycle and process a verified request with `process`.
    ///
    /// # Errors
    ///
    /// [`HandlerFault`] if the handler has already advanced past the start.
    pub fn receive_with<F>(
        &mut self,
        source: &dyn RequestSource,
        process: F,
    ) -> Result<Reply, HandlerFault>
    where
        F: FnOnce(&mut Self) -> Reply,
    {
        match self.receive(source)? {
            Outcome::Reply(reply) => Ok(reply),
            Outcome::Proceed => {
                self.advance(Stage::Processed)?;
                Ok(process(self))
            }
        }
    }

    /// Parse the auth header and learn the claimed account id.
    ///
    /// Returns the error reply to send when the header is missing (and the
    /// resource is not public) or malformed.
    ///
    /// # Errors
    ///
    /// [`HandlerFault`] when called out of sequence.
    pub fn identify(&mut self, source: &dyn RequestSource) -> Result<Option<Reply>, HandlerFault> {
        self.advance(Stage::Identified)?;

        match AuthContext::from_request(self.options.auth.clone(), source, self.options.public) {
            Ok(Some(ctx)) => {
                debug!(account_id = %ctx.account_id(), request_id = %ctx.request_id(), "request identified");
                self.context = Some(ctx);
                Ok(None)
            }
            Ok(None) => {
                debug!("unsigned public request");
                Ok(None)
            }
            Err(err) => Ok(Some(self.reply_error(ReplyError::Protocol(err)))),
        }
    }

    /// Ask the authorizer for the claimed account's shared key.
    ///
    /// Returns the denial reply to send when the account is refused.
    ///
    /// # Errors
    ///
    /// [`HandlerFault`] when called out of sequence.
    pub fn authorize(&mut self) -> Result<Option<Reply>, HandlerFault> {
        self.advance(Stage::Authorized)?;

        match self.authorizer.authorize(self.context.as_ref()) {
            Authorization::Authorized { account_key } => {
                self.account_key = account_key;
                Ok(None)
            }
            Authorization::Denied(denial) => Ok(Some(self.reply_error(ReplyError::Denied(denial)))),
        }
    }

    /// Check required x-headers, replay window and signature.
    ///
    /// An unsigned public request, or one authorized with an empty key,
    /// advances without checks. Returns the error reply to send when a
    /// check fails.
    ///
    /// # Errors
    ///
    /// [`HandlerFault`] when called out of sequence.
    pub fn verify(&mut self) -> Result<Option<Reply>, HandlerFault> {
        self.advance(Stage::Verified)?;

        if let Some(ctx) = &self.context {
            if !self.account_key.is_empty() {
                let required: Vec<&str> = self.required.iter().map(String::as_str).collect();
                if let Err(err) = ctx.check(&required, &self.account_key, 0) {
                    return Ok(Some(self.reply_error(ReplyError::Protocol(err))));
                }
                debug!(account_id = %ctx.account_id(), "request verified");
            }
        }

        Ok(None)
    }

    /// Form the success reply, signing it when the request was signed and
    /// either strict mode is on or outbound x-headers are configured.
    ///
    /// `headers` are raw caller lines; a status or `Location` line moves to
    /// the front and sets [`Reply::status`] to 0.
    #[must_use]
    pub fn reply(&self, content: &[u8], headers: &[String]) -> Reply {
        let (status, mut lines) = unique_headers(headers);

        if let Some(ctx) = &self.context {
            let sign = !ctx.account_id().is_empty()
                && (self.options.strict || !self.options.xheaders.is_empty());

            if sign {
                let account = Credentials::new(ctx.account_id(), self.account_key.clone());
                match ctx.for_response(&account, &self.options.xheaders) {
                    Ok(signed) => {
                        for (name, value) in signed.header_lines() {
                            lines.push(format!("{name}: {value}"));
                        }
                    }
                    Err(err) => return self.reply_error(ReplyError::Protocol(err)),
                }
            }
        }

        Reply {
            status,
            headers: lines,
            body: content.to_vec(),
        }
    }

    /// Form an error reply.
    #[must_use]
    pub fn reply_error(&self, error: ReplyError) -> Reply {
        let (resource, query) = self
            .context
            .as_ref()
            .map(|ctx| (ctx.path().to_owned(), ctx.query().to_owned()))
            .unwrap_or_default();

        match error {
            ReplyError::Internal => Reply {
                status: 500,
                ..Reply::default()
            },
            ReplyError::Status(status) => Reply {
                status,
                ..Reply::default()
            },
            ReplyError::Denied(denial) => {
                warn!(account_id = %self.account_id(), code = %denial.code, "request denied");
                Reply {
                    status: denial.status,
                    headers: Vec::new(),
                    body: error_body(&denial.code, &denial.message, &resource, &query, &denial.extra),
                }
            }
            ReplyError::Protocol(err) => {
                warn!(account_id = %self.account_id(), code = %err.code, "request rejected");
                Reply {
                    status: err.status_code().as_u16(),
                    headers: Vec::new(),
                    body: error_body(err.code.as_str(), &err.message, &resource, &query, &Map::new()),
                }
            }
        }
    }

    /// The claimed account id, empty for an unsigned request.
    #[must_use]
    pub fn account_id(&self) -> &str {
        self.context.as_ref().map_or("", AuthContext::account_id)
    }

    /// An x-header from the request, by bare or prefixed name.
    #[must_use]
    pub fn request_xheader(&self, name: &str) -> Option<String> {
        self.context.as_ref().and_then(|ctx| ctx.xheader(name))
    }

    /// Add an x-header to be signed into the reply.
    pub fn set_response_xheader(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.options.xheaders.push((name.into(), value.into()));
    }

    /// Require x-headers, given as a comma-separated list of bare or
    /// prefixed names.
    pub fn set_required(&mut self, names: &str) {
        self.required.extend(
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
        );
    }

    /// Require (or stop requiring) signed replies.
    pub fn set_strict_mode(&mut self, strict: bool) {
        self.options.strict = strict;
    }

    /// The current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The parsed request context, if the request was signed.
    #[must_use]
    pub fn context(&self) -> Option<&AuthContext> {
        self.context.as_ref()
    }

    fn advance(&mut self, requested: Stage) -> Result<(), HandlerFault> {
        if self.stage.next() == Some(requested) {
            self.stage = requested;
            Ok(())
        } else {
            Err(HandlerFault::OutOfSequence {
                current: self.stage,
                requested,
            })
        }
    }
}
