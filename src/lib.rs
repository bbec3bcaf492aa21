//! Mailbox reader library
//!
//! Fetches the most recent messages of an IMAP mailbox over implicit
//! TLS and turns each one into a [`NormalizedMessage`]: decoded
//! subject, sender, timestamp and a plain-text body.
//!
//! Every call to [`MailReader::fetch_recent`] opens its own
//! [`MailSession`] and closes it again, whether the request succeeds
//! or not. Failures are reported as an [`Error`] naming the [`Phase`]
//! that failed; problems decoding a body never fail the request and
//! show up as a placeholder body instead.
//!
//! The library only emits `tracing` events inside a per-request
//! `mailbox` span. Install a subscriber to see them.

mod config;
mod connection;
mod credentials;
mod decode;
mod error;
mod folder;
mod message;
mod reader;
mod session;

pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_FETCH_LIMIT, FetchErrorPolicy, ImapConfig, TlsVerification,
};
pub use credentials::MailboxCredentials;
pub use decode::{DecodeError, NO_CONTENT_PLACEHOLDER, decode_message};
pub use error::{Error, Phase, Result};
pub use folder::Folder;
pub use message::{NormalizedMessage, RawMessage};
pub use reader::MailReader;
pub use session::{MailSession, SessionState};
