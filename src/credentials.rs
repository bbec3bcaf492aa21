//! Mailbox login credentials

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::fmt;

/// Address and secret for one mailbox account.
///
/// The secret is usually an app-specific password. Providers display
/// those in space-separated groups (`abcd efgh ijkl mnop`) and users
/// paste them as shown, so whitespace is removed before LOGIN.
#[derive(Clone)]
pub struct MailboxCredentials {
    address: String,
    secret: SecretString,
}

impl MailboxCredentials {
    #[must_use]
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Load credentials from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_ADDRESS`
    /// - `IMAP_SECRET`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let address =
            env::var("IMAP_ADDRESS").map_err(|_| Error::Config("IMAP_ADDRESS not set".into()))?;
        let secret =
            env::var("IMAP_SECRET").map_err(|_| Error::Config("IMAP_SECRET not set".into()))?;
        Ok(Self::new(address, secret))
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The secret as sent with LOGIN: all whitespace removed.
    pub(crate) fn login_secret(&self) -> String {
        self.secret
            .expose_secret()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }
}

impl fmt::Debug for MailboxCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxCredentials")
            .field("address", &self.address)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
