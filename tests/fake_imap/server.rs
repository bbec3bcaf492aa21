//! In-process fake IMAP server for integration testing
//!
//! # Connection lifecycle
//!
//! The server speaks implicit TLS, the way public providers do on
//! port 993: the TLS handshake happens first and the IMAP greeting is
//! the first thing sent over the encrypted stream.
//!
//! ```text
//!   Client connects via TCP
//!       |
//!   TLS handshake
//!       |
//!   Server sends greeting: "* OK IMAP4rev1 ready\r\n"
//!       |
//!   Client sends LOGIN with address and secret
//!       |
//!   SELECT INBOX -> SEARCH ALL -> FETCH n (BODY.PEEK[]) ...
//!       |
//!   Client sends LOGOUT
//! ```
//!
//! Every client command starts with a tag (async-imap uses `A0001`,
//! `A0002`, ...) that the server echoes in the tagged completion:
//!
//! ```text
//!   Client:  A0002 SEARCH ALL
//!   Server:  * SEARCH 1 2 3
//!   Server:  A0002 OK SEARCH completed
//! ```
//!
//! Message bodies travel as counted literals: `{bytecount}\r\n`
//! followed by exactly that many raw bytes.

use super::handlers::{handle_fetch, handle_login, handle_logout, handle_search, handle_select};
use super::io::write_line;
use super::mailbox::Mailbox;
use super::stats::ServerStats;
use imap_codec::CommandCodec;
use imap_codec::decode::Decoder;
use imap_codec::imap_types::command::CommandBody;
use imap_codec::imap_types::mailbox::Mailbox as ImapMailbox;
use rcgen::generate_simple_self_signed;
use rustls::pki_types::PrivatePkcs8KeyDer;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// A fake IMAP server that runs on localhost with an OS-assigned port.
///
/// The server generates a self-signed TLS certificate at startup using
/// `rcgen`, so clients must be configured with
/// `TlsVerification::AcceptInvalidCerts`.
pub struct FakeImapServer {
    port: u16,
    stats: Arc<ServerStats>,
    /// Handle to the background task so it lives as long as the server.
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeImapServer {
    /// Start a new fake IMAP server serving the given account.
    pub async fn start(mailbox: Mailbox) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let cert = generate_simple_self_signed(vec!["127.0.0.1".to_string()])
            .expect("generate self-signed cert");

        let cert_der = cert.cert.der().clone();
        let key_der = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());

        let tls_config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .expect("default protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der.into())
        .expect("build server TLS config");

        let acceptor = TlsAcceptor::from(Arc::new(tls_config));
        let mailbox = Arc::new(mailbox);
        let stats = Arc::new(ServerStats::default());

        let server_stats = Arc::clone(&stats);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _addr)) = listener.accept().await else {
                    break;
                };
                let guard = server_stats.connection_opened();
                let acceptor = acceptor.clone();
                let mailbox = Arc::clone(&mailbox);
                let stats = Arc::clone(&server_stats);
                tokio::spawn(async move {
                    handle_connection(stream, acceptor, &mailbox, &stats).await;
                    drop(guard);
                });
            }
        });

        Self {
            port,
            stats,
            _handle: handle,
        }
    }

    /// The port the server is listening on.
    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }
}

/// Handle a single IMAP client connection.
async fn handle_connection(
    stream: tokio::net::TcpStream,
    acceptor: TlsAcceptor,
    mailbox: &Mailbox,
    stats: &ServerStats,
) {
    let Ok(tls_stream) = acceptor.accept(stream).await else {
        return;
    };

    let mut reader = BufReader::new(tls_stream);

    // RFC 3501 Section 7.1.1: Server greeting
    if write_line(&mut reader, "* OK IMAP4rev1 Fake server ready\r\n")
        .await
        .is_err()
    {
        return;
    }

    handle_imap_session(reader, mailbox, stats).await;
}

/// Extract the folder name from a parsed `imap_types::Mailbox`.
fn mailbox_name(mb: &ImapMailbox<'_>) -> String {
    match mb {
        ImapMailbox::Inbox => "INBOX".to_string(),
        ImapMailbox::Other(other) => {
            let bytes: &[u8] = other.as_ref();
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Run the IMAP command loop over an established stream.
///
/// Uses `imap-codec`'s `CommandCodec` to parse each client command,
/// then dispatches on the `CommandBody` variant. Commands other than
/// LOGIN require a successful LOGIN first.
async fn handle_imap_session<S: AsyncRead + AsyncWrite + Unpin>(
    mut reader: BufReader<S>,
    mailbox: &Mailbox,
    stats: &ServerStats,
) {
    let mut authenticated = false;
    let mut selected_folder: Option<String> = None;
    let codec = CommandCodec::default();

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Ok((_, command)) = codec.decode(line.as_bytes()) else {
            let tag = trimmed.split_whitespace().next().unwrap_or("*");
            let resp = format!("{tag} BAD Parse error\r\n");
            if write_line(&mut reader, &resp).await.is_err() {
                break;
            }
            continue;
        };

        let tag = command.tag.inner();

        match command.body {
            CommandBody::Login { .. } => {
                authenticated = handle_login(tag, trimmed, mailbox, stats, &mut reader).await;
            }
            CommandBody::Logout => {
                handle_logout(tag, mailbox, stats, &mut reader).await;
                break;
            }
            _ if !authenticated => {
                let resp = format!("{tag} BAD Not authenticated\r\n");
                if write_line(&mut reader, &resp).await.is_err() {
                    break;
                }
            }
            CommandBody::Select { mailbox: mb, .. } => {
                let name = mailbox_name(&mb);
                selected_folder = handle_select(tag, &name, mailbox, &mut reader).await;
            }
            CommandBody::Search {
                criteria,
                uid: false,
                ..
            } => {
                handle_search(
                    tag,
                    criteria.as_ref(),
                    mailbox,
                    selected_folder.as_deref(),
                    &mut reader,
                )
                .await;
            }
            CommandBody::Fetch {
                sequence_set,
                uid: false,
                ..
            } => {
                handle_fetch(
                    tag,
                    &sequence_set,
                    mailbox,
                    selected_folder.as_deref(),
                    &mut reader,
                )
                .await;
            }
            _ => {
                let resp = format!("{tag} BAD Unknown command\r\n");
                if write_line(&mut reader, &resp).await.is_err() {
                    break;
                }
            }
        }
    }
}
