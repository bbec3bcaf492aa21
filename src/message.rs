//! Message records passed between the session and the decoder

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One message exactly as the server returned it.
///
/// `seq` is the IMAP sequence number the message was fetched by.
/// The payload is consumed by [`crate::decode_message`] and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub seq: u32,
    pub payload: Vec<u8>,
}

/// A decoded message, ready to hand to an application.
///
/// `body` is never empty: when no text could be extracted it holds a
/// placeholder explaining why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedMessage {
    pub seq: u32,
    pub subject: String,
    pub sender: String,
    /// The raw `Date` header, if present.
    pub date: Option<String>,
    /// The parsed `Date` header, or the time of decoding when the
    /// header is missing or unparseable.
    pub received_at: DateTime<Utc>,
    pub body: String,
    pub has_attachments: bool,
}
