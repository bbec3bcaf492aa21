//! Error types for mailbox-reader
//!
//! Every hard failure carries the [`Phase`] of the mailbox read in
//! which it happened. Body decoding never produces an [`Error`]; see
//! [`crate::decode`].

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The step of a mailbox read that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// TCP connect and TLS handshake.
    Connect,
    /// LOGIN.
    Authenticate,
    /// SELECT of the target folder.
    SelectFolder,
    /// SEARCH for message identifiers.
    List,
    /// FETCH of a single message.
    Fetch,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Authenticate => "authentication",
            Self::SelectFolder => "folder selection",
            Self::List => "listing",
            Self::Fetch => "fetch",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timed out during {phase} after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("IMAP {phase} failed: {reason}")]
    Protocol { phase: Phase, reason: String },

    #[error("Failed to fetch message {seq}: {reason}")]
    Fetch { seq: u32, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The phase of the mailbox read that produced this error.
    ///
    /// Returns `None` for configuration errors, which happen before
    /// any connection is attempted.
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match self {
            Self::Connection(_) | Self::Io(_) => Some(Phase::Connect),
            Self::Timeout { phase, .. } | Self::Protocol { phase, .. } => Some(*phase),
            Self::Auth(_) => Some(Phase::Authenticate),
            Self::Fetch { .. } => Some(Phase::Fetch),
            Self::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
