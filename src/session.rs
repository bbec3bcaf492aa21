//! One IMAP session, from connect to logout
//!
//! A [`MailSession`] exclusively owns its connection. It moves through
//! [`SessionState`] as operations succeed and is consumed by
//! [`MailSession::close`].

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession};
use crate::credentials::MailboxCredentials;
use crate::error::{Error, Phase, Result};
use crate::folder::Folder;
use crate::message::RawMessage;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// Where a session is in its lifecycle.
///
/// `Disconnected` and `Connected` are transient inside
/// [`MailSession::open`]; a returned session is at least
/// `Authenticated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Authenticated,
    FolderSelected(Folder),
    Closed,
}

/// An authenticated mailbox session.
pub struct MailSession {
    inner: ImapSession,
    state: SessionState,
}

impl MailSession {
    /// Connect and authenticate.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] or [`Error::Timeout`] if the server
    /// cannot be reached, [`Error::Auth`] if LOGIN is rejected. The
    /// connection is released before an error is returned.
    pub async fn open(config: &ImapConfig, credentials: MailboxCredentials) -> Result<Self> {
        let mut state = SessionState::Disconnected;
        debug!(?state, "Opening session");

        let client = connection::connect(config).await?;
        state = SessionState::Connected;
        debug!(?state, "Authenticating");

        let inner = connection::login(client, &credentials, config.connect_timeout).await?;
        Ok(Self {
            inner,
            state: SessionState::Authenticated,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// SELECT a folder and return its message count.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] with [`Phase::SelectFolder`] if the folder
    /// does not exist or the server refuses the command.
    pub async fn select_folder(&mut self, folder: &Folder) -> Result<u32> {
        let mailbox = self
            .inner
            .select(folder.as_str())
            .await
            .map_err(|e| Error::Protocol {
                phase: Phase::SelectFolder,
                reason: format!("{folder}: {e}"),
            })?;

        info!("Selected {} ({} messages)", folder, mailbox.exists);
        self.state = SessionState::FolderSelected(folder.clone());
        Ok(mailbox.exists)
    }

    /// The sequence numbers of the newest `limit` messages in the
    /// selected folder, in ascending (arrival) order.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] with [`Phase::List`] if no folder is
    /// selected or SEARCH fails.
    pub async fn list_recent(&mut self, limit: usize) -> Result<Vec<u32>> {
        if !matches!(self.state, SessionState::FolderSelected(_)) {
            return Err(Error::Protocol {
                phase: Phase::List,
                reason: "no folder selected".into(),
            });
        }

        let ids = self
            .inner
            .search("ALL")
            .await
            .map_err(|e| Error::Protocol {
                phase: Phase::List,
                reason: format!("Search failed: {e}"),
            })?;

        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();

        let recent = newest(ids, limit);
        info!("Found {} recent messages", recent.len());
        Ok(recent)
    }

    /// FETCH the full message with sequence number `seq`.
    ///
    /// The message is fetched with `BODY.PEEK[]` so its `\Seen` flag
    /// is left alone.
    ///
    /// # Errors
    ///
    /// [`Error::Fetch`] if the command fails or the server returns no
    /// message body.
    pub async fn fetch(&mut self, seq: u32) -> Result<RawMessage> {
        debug!("Fetching message {}", seq);
        let mut responses = self
            .inner
            .fetch(seq.to_string(), "(BODY.PEEK[])")
            .await
            .map_err(|e| Error::Fetch {
                seq,
                reason: e.to_string(),
            })?;

        // Drain the stream so the tagged completion is consumed before
        // the next command.
        let mut payload = None;
        while let Some(response) = responses.next().await {
            let fetched = response.map_err(|e| Error::Fetch {
                seq,
                reason: e.to_string(),
            })?;
            if payload.is_none() {
                payload = fetched.body().map(<[u8]>::to_vec);
            }
        }

        payload
            .map(|payload| RawMessage { seq, payload })
            .ok_or_else(|| Error::Fetch {
                seq,
                reason: "server returned no message body".into(),
            })
    }

    /// LOGOUT and release the connection.
    ///
    /// Logout errors are logged and otherwise ignored: by the time a
    /// session is closed the outcome of the request is already known.
    pub async fn close(mut self) {
        if let Err(e) = self.inner.logout().await {
            warn!("Ignoring logout failure: {}", e);
        }
        self.state = SessionState::Closed;
        debug!(state = ?self.state, "Session closed");
    }
}

/// The last `limit` entries of an ascending id list.
fn newest(mut ids: Vec<u32>, limit: usize) -> Vec<u32> {
    let start = ids.len().saturating_sub(limit);
    ids.drain(..start);
    ids
}
