//! IMAP connection configuration

use crate::error::{Error, Result};
use crate::folder::Folder;
use std::env;
use std::time::Duration;

/// Default number of recent messages returned per request.
pub const DEFAULT_FETCH_LIMIT: usize = 5;

/// Default bound on TCP connect plus TLS handshake, and on LOGIN.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the server certificate is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsVerification {
    /// Verify against the Mozilla root store shipped in `webpki-roots`.
    #[default]
    WebPki,
    /// Accept any certificate. Only for local bridges and test servers
    /// that present self-signed certificates.
    AcceptInvalidCerts,
}

/// What to do when a single message cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchErrorPolicy {
    /// Abort the whole request with [`Error::Fetch`].
    #[default]
    Abort,
    /// Log the failure and continue with the remaining messages.
    Skip,
}

/// IMAP connection configuration
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub folder: Folder,
    pub limit: usize,
    pub connect_timeout: Duration,
    pub tls: TlsVerification,
    pub on_fetch_error: FetchErrorPolicy,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
            folder: Folder::Inbox,
            limit: DEFAULT_FETCH_LIMIT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            tls: TlsVerification::WebPki,
            on_fetch_error: FetchErrorPolicy::Abort,
        }
    }
}

impl ImapConfig {
    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. All variables are optional:
    /// - `IMAP_HOST` (default: `imap.gmail.com`)
    /// - `IMAP_PORT` (default: `993`)
    /// - `IMAP_FOLDER` (default: `INBOX`)
    /// - `IMAP_FETCH_LIMIT` (default: `5`)
    /// - `IMAP_CONNECT_TIMEOUT_SECS` (default: `30`)
    /// - `IMAP_ACCEPT_INVALID_CERTS` (default: `false`)
    /// - `IMAP_SKIP_FAILED_FETCHES` (default: `false`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("IMAP_PORT") {
            Some(v) => v
                .parse()
                .map_err(|e| Error::Config(format!("Invalid IMAP_PORT: {e}")))?,
            None => defaults.port,
        };
        let limit = match lookup("IMAP_FETCH_LIMIT") {
            Some(v) => v
                .parse()
                .map_err(|e| Error::Config(format!("Invalid IMAP_FETCH_LIMIT: {e}")))?,
            None => defaults.limit,
        };
        let connect_timeout = match lookup("IMAP_CONNECT_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .map(Duration::from_secs)
                .map_err(|e| Error::Config(format!("Invalid IMAP_CONNECT_TIMEOUT_SECS: {e}")))?,
            None => defaults.connect_timeout,
        };
        let tls = if parse_flag(lookup("IMAP_ACCEPT_INVALID_CERTS"), "IMAP_ACCEPT_INVALID_CERTS")? {
            TlsVerification::AcceptInvalidCerts
        } else {
            TlsVerification::WebPki
        };
        let on_fetch_error =
            if parse_flag(lookup("IMAP_SKIP_FAILED_FETCHES"), "IMAP_SKIP_FAILED_FETCHES")? {
                FetchErrorPolicy::Skip
            } else {
                FetchErrorPolicy::Abort
            };

        Ok(Self {
            host: lookup("IMAP_HOST").unwrap_or(defaults.host),
            port,
            folder: lookup("IMAP_FOLDER").map_or(defaults.folder, Folder::from),
            limit,
            connect_timeout,
            tls,
            on_fetch_error,
        })
    }
}

fn parse_flag(value: Option<String>, name: &str) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!("Invalid {name}: {other}"))),
    }
}
