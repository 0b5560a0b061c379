//! The request-handling lifecycle.
//!
//! Every inbound request moves through the same fixed sequence:
//! identify, authorize, verify, process. Calling a step out of order is a
//! programming error in the host, reported as a typed [`HandlerFault`]
//! rather than a protocol reply.

use std::fmt;

/// Position in the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Start,
    /// The auth header has been parsed and the account id is known.
    Identified,
    /// The authorizer has produced a key (or a denial reply went out).
    Authorized,
    /// The request signature and replay window have been checked.
    Verified,
    /// The host has produced its reply.
    Processed,
}

impl Stage {
    /// The only stage that may legally follow this one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::Identified),
            Self::Identified => Some(Self::Authorized),
            Self::Authorized => Some(Self::Verified),
            Self::Verified => Some(Self::Processed),
            Self::Processed => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Identified => "identified",
            Self::Authorized => "authorized",
            Self::Verified => "verified",
            Self::Processed => "processed",
        };
        f.write_str(name)
    }
}

/// A host programming error, distinct from a protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandlerFault {
    /// A lifecycle step was invoked out of order.
    #[error("handler called out of sequence: at {current}, requested {requested}")]
    OutOfSequence {
        /// The stage the handler is currently in.
        current: Stage,
        /// The stage the caller tried to enter.
        requested: Stage,
    },
}
