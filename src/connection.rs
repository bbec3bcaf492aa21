//! TLS transport and login
//!
//! Low-level steps of opening a mailbox: a timed TCP connect plus
//! implicit-TLS handshake, then LOGIN. Used by [`crate::MailSession`].

use crate::config::{ImapConfig, TlsVerification};
use crate::credentials::MailboxCredentials;
use crate::error::{Error, Phase, Result};
use async_imap::{Client, Session};
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

/// The encrypted byte stream IMAP runs over.
pub type ImapStream = Compat<TlsStream<TcpStream>>;

/// A connected, not yet authenticated client.
pub type ImapClient = Client<ImapStream>;

/// An authenticated IMAP session.
pub type ImapSession = Session<ImapStream>;

/// Build a TLS connector for the configured verification mode.
///
/// The ring provider is selected here rather than relying on a
/// process-wide default.
fn tls_connector(verification: TlsVerification) -> Result<TlsConnector> {
    let builder = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Connection(format!("TLS setup failed: {e}")))?;

    let config = match verification {
        TlsVerification::WebPki => {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsVerification::AcceptInvalidCerts => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
            .with_no_client_auth(),
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Open a TLS connection to `config.host:config.port`.
///
/// TCP connect and the TLS handshake together are bounded by
/// `config.connect_timeout`.
pub async fn connect(config: &ImapConfig) -> Result<ImapClient> {
    let addr = format!("{}:{}", config.host, config.port);
    debug!("Connecting to IMAP server at {}", addr);

    let connector = tls_connector(config.tls)?;
    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| Error::Connection(format!("Invalid server name: {e}")))?;

    let handshake = async {
        let tcp_stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| Error::Connection(format!("Could not reach {addr}: {e}")))?;
        connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| Error::Connection(format!("TLS handshake failed: {e}")))
    };

    let tls_stream = timeout(config.connect_timeout, handshake)
        .await
        .map_err(|_| Error::Timeout {
            phase: Phase::Connect,
            after: config.connect_timeout,
        })??;

    info!("Connected to IMAP server at {}", addr);
    Ok(Client::new(tls_stream.compat()))
}

/// LOGIN with the account credentials.
///
/// A rejected LOGIN is reported as [`Error::Auth`]. On any failure the
/// connection is shut down before returning.
pub async fn login(
    client: ImapClient,
    credentials: &MailboxCredentials,
    limit: std::time::Duration,
) -> Result<ImapSession> {
    let secret = credentials.login_secret();
    let attempt = client.login(credentials.address(), &secret);

    match timeout(limit, attempt).await {
        Ok(Ok(session)) => {
            info!("Logged in as {}", credentials.address());
            Ok(session)
        }
        Ok(Err((e, client))) => {
            warn!("Login rejected for {}: {}", credentials.address(), e);
            shutdown(client).await;
            Err(classify_login_error(e))
        }
        Err(_) => Err(Error::Timeout {
            phase: Phase::Authenticate,
            after: limit,
        }),
    }
}

/// Tell a server-side rejection apart from a dropped connection.
fn classify_login_error(e: async_imap::error::Error) -> Error {
    match e {
        async_imap::error::Error::No(reason) | async_imap::error::Error::Bad(reason) => {
            Error::Auth(reason)
        }
        async_imap::error::Error::Io(io) => Error::Connection(format!("Login failed: {io}")),
        async_imap::error::Error::ConnectionLost => {
            Error::Connection("Connection lost during login".into())
        }
        other => Error::Auth(other.to_string()),
    }
}

/// Close the TLS stream of a client that never authenticated.
async fn shutdown(client: ImapClient) {
    let mut stream = client.into_inner().into_inner();
    if let Err(e) = stream.shutdown().await {
        debug!("Ignoring error while closing connection: {}", e);
    }
}

/// Certificate verifier that accepts all certificates
/// (for bridges and test servers with self-signed certs).
#[derive(Debug)]
struct AcceptAnyCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
