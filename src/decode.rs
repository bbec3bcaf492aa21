//! Message decoding
//!
//! Turns a [`RawMessage`] into a [`NormalizedMessage`]. Decoding never
//! fails: every problem with the body ends up as a placeholder string
//! in [`NormalizedMessage::body`].
//!
//! Body selection:
//! - multipart messages: the first `text/plain` part, in document
//!   order, whose disposition is not `attachment`
//! - single-part messages: the sole payload, whatever its type
//!
//! Text is decoded with the declared charset, or UTF-8 when none is
//! declared. Invalid byte sequences are replaced, not rejected.

use crate::message::{NormalizedMessage, RawMessage};
use chrono::{DateTime, Utc};
use mailparse::{DispositionType, MailHeader, MailHeaderMap, MailParseError, ParsedMail};
use thiserror::Error;
use tracing::{debug, error};

/// Body used when a message has no inline plain-text content.
pub const NO_CONTENT_PLACEHOLDER: &str = "(no suitable text content found)";

/// Why the body of a message could not be turned into text.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(MailParseError),

    #[error("undecodable body: {0}")]
    Content(MailParseError),
}

/// Outcome of body extraction, before placeholders are applied.
#[derive(Debug)]
enum Body {
    Text(String),
    NoContent,
    Failed(DecodeError),
}

impl Body {
    fn into_text(self, seq: u32) -> String {
        match self {
            Self::Text(text) => text,
            Self::NoContent => {
                debug!(seq, "No inline plain-text part");
                NO_CONTENT_PLACEHOLDER.to_string()
            }
            Self::Failed(e) => {
                error!(seq, error = %e, "Failed to decode message body");
                format!("(failed to decode content: {e})")
            }
        }
    }
}

/// Decode a raw message, stamping undated messages with the current
/// time.
#[must_use]
pub fn decode_message(raw: RawMessage) -> NormalizedMessage {
    decode_message_at(raw, Utc::now())
}

pub(crate) fn decode_message_at(raw: RawMessage, now: DateTime<Utc>) -> NormalizedMessage {
    let RawMessage { seq, payload } = raw;

    let mail = match mailparse::parse_mail(&payload) {
        Ok(mail) => mail,
        Err(e) => {
            return NormalizedMessage {
                seq,
                subject: String::new(),
                sender: String::new(),
                date: None,
                received_at: now,
                body: Body::Failed(DecodeError::Malformed(e)).into_text(seq),
                has_attachments: false,
            };
        }
    };

    let date = mail.headers.get_first_value("Date");
    let received_at = date.as_deref().and_then(parse_date).unwrap_or(now);

    NormalizedMessage {
        seq,
        subject: header_text(&mail.headers, "Subject").unwrap_or_default(),
        sender: header_text(&mail.headers, "From").unwrap_or_default(),
        date,
        received_at,
        body: extract_body(&mail).into_text(seq),
        has_attachments: has_attachments(&mail),
    }
}

fn extract_body(mail: &ParsedMail<'_>) -> Body {
    let candidate = if is_multipart(mail) {
        first_inline_plain_text(mail)
    } else {
        Some(mail)
    };

    let Some(part) = candidate else {
        return Body::NoContent;
    };

    match decode_text(part) {
        Ok(text) if text.trim().is_empty() => Body::NoContent,
        Ok(text) => Body::Text(text),
        Err(e) => Body::Failed(DecodeError::Content(e)),
    }
}

fn is_multipart(mail: &ParsedMail<'_>) -> bool {
    mail.ctype.mimetype.starts_with("multipart/") || !mail.subparts.is_empty()
}

fn is_attachment(part: &ParsedMail<'_>) -> bool {
    part.get_content_disposition().disposition == DispositionType::Attachment
}

/// Depth-first, document-order search for the first inline
/// `text/plain` part.
fn first_inline_plain_text<'m>(part: &'m ParsedMail<'m>) -> Option<&'m ParsedMail<'m>> {
    if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") && !is_attachment(part) {
        return Some(part);
    }
    part.subparts.iter().find_map(first_inline_plain_text)
}

fn has_attachments(part: &ParsedMail<'_>) -> bool {
    is_attachment(part) || part.subparts.iter().any(has_attachments)
}

/// Decode a part's transfer encoding and charset.
///
/// mailparse reports `us-ascii` both when it is declared and when no
/// charset is given at all. UTF-8 is a superset of ASCII, so both
/// cases are decoded as lossy UTF-8.
fn decode_text(part: &ParsedMail<'_>) -> Result<String, MailParseError> {
    if part.ctype.charset.eq_ignore_ascii_case("us-ascii") {
        let bytes = part.get_body_raw()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        part.get_body()
    }
}

/// Decode a header value, reading raw 8-bit bytes as UTF-8 when they
/// form valid UTF-8. mailparse alone would read them as Latin-1.
fn header_text(headers: &[MailHeader<'_>], name: &str) -> Option<String> {
    let header = headers.get_first_header(name)?;
    let raw = header.get_value_raw();
    match std::str::from_utf8(raw) {
        Ok(text) if !raw.is_ascii() => Some(unfold(text)),
        _ => Some(header.get_value()),
    }
}

fn unfold(value: &str) -> String {
    value.replace("\r\n", "").replace('\n', "").trim().to_string()
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
