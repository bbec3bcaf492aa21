//! Mailbox folder names
//!
//! The reader selects one folder per request. `INBOX` is the default
//! and the only name IMAP guarantees; Gmail exposes its system labels
//! under the `[Gmail]/` hierarchy.

use std::fmt;

/// A folder to select before listing messages.
///
/// # Examples
///
/// ```
/// use mailbox_reader::Folder;
///
/// assert_eq!(Folder::default().as_str(), "INBOX");
/// assert_eq!(Folder::from("inbox"), Folder::Inbox);
/// assert_eq!(Folder::from("Receipts").as_str(), "Receipts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Folder {
    /// The primary inbox (RFC 3501, case-insensitive).
    #[default]
    Inbox,
    /// Gmail's combined archive, `[Gmail]/All Mail`.
    AllMail,
    /// Gmail's sent label, `[Gmail]/Sent Mail`.
    Sent,
    /// Gmail's spam label, `[Gmail]/Spam`.
    Spam,
    /// Any other folder, passed to SELECT verbatim.
    Custom(String),
}

impl Folder {
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// The name sent on the wire with SELECT.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbox => "INBOX",
            Self::AllMail => "[Gmail]/All Mail",
            Self::Sent => "[Gmail]/Sent Mail",
            Self::Spam => "[Gmail]/Spam",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Folder {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("inbox") {
            return Self::Inbox;
        }
        match s {
            "[Gmail]/All Mail" => Self::AllMail,
            "[Gmail]/Sent Mail" => Self::Sent,
            "[Gmail]/Spam" => Self::Spam,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for Folder {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
