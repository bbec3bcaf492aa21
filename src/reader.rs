//! Mailbox reader
//!
//! Runs one complete request per call: open a [`MailSession`], select
//! the configured folder, fetch and decode, then close the session on
//! every exit path.

use crate::config::{FetchErrorPolicy, ImapConfig};
use crate::credentials::MailboxCredentials;
use crate::decode::decode_message;
use crate::error::Result;
use crate::message::NormalizedMessage;
use crate::session::MailSession;
use tracing::{Instrument, info, info_span, warn};

/// Reads recent messages from a mailbox.
///
/// Each call opens its own connection; a `MailReader` holds only
/// configuration and can be shared between concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct MailReader {
    config: ImapConfig,
}

impl MailReader {
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ImapConfig {
        &self.config
    }

    /// Fetch the `config.limit` most recent messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns the first connection, authentication, SELECT, SEARCH or
    /// (under [`FetchErrorPolicy::Abort`]) FETCH failure. Body decoding
    /// never fails a request.
    pub async fn fetch_recent(
        &self,
        credentials: MailboxCredentials,
    ) -> Result<Vec<NormalizedMessage>> {
        let span = info_span!("mailbox", account = %credentials.address());
        async move {
            let mut session = MailSession::open(&self.config, credentials).await?;
            let outcome = self.read_recent(&mut session).await;
            session.close().await;

            if let Ok(messages) = &outcome {
                info!("Finished reading {} messages", messages.len());
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Fetch and decode one message by sequence number.
    ///
    /// # Errors
    ///
    /// Returns the first connection, authentication, SELECT or FETCH
    /// failure.
    pub async fn fetch_message(
        &self,
        credentials: MailboxCredentials,
        seq: u32,
    ) -> Result<NormalizedMessage> {
        let span = info_span!("mailbox", account = %credentials.address());
        async move {
            let mut session = MailSession::open(&self.config, credentials).await?;
            let outcome: Result<NormalizedMessage> = async {
                session.select_folder(&self.config.folder).await?;
                let raw = session.fetch(seq).await?;
                Ok(decode_message(raw))
            }
            .await;
            session.close().await;
            outcome
        }
        .instrument(span)
        .await
    }

    async fn read_recent(&self, session: &mut MailSession) -> Result<Vec<NormalizedMessage>> {
        session.select_folder(&self.config.folder).await?;
        let recent = session.list_recent(self.config.limit).await?;

        let mut messages = Vec::with_capacity(recent.len());
        for seq in recent.into_iter().rev() {
            let raw = match session.fetch(seq).await {
                Ok(raw) => raw,
                Err(e) if self.config.on_fetch_error == FetchErrorPolicy::Skip => {
                    warn!("Skipping message {}: {}", seq, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let message = decode_message(raw);
            info!("Read message {}: {}", seq, message.subject);
            messages.push(message);
        }
        Ok(messages)
    }
}
