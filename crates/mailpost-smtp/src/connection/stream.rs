//! Socket setup: plain TCP, implicit TLS and the STARTTLS upgrade.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

use crate::config::{DEFAULT_CONNECT_TIMEOUT, Endpoint, SecurityMode};
use crate::error::{Error, Result};

/// Byte stream a session can run over.
pub trait MailStream: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

impl<T> MailStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

/// Type-erased stream, plain or encrypted.
pub type BoxedStream = Box<dyn MailStream>;

/// Opens sockets for a session and upgrades them in place.
pub trait Connector {
    /// Opens a connection to `endpoint`.
    ///
    /// With [`SecurityMode::ImplicitTls`] the returned stream is already
    /// encrypted.
    fn connect(&self, endpoint: &Endpoint) -> impl Future<Output = Result<BoxedStream>> + Send;

    /// Negotiates TLS over an already-open stream after `STARTTLS`.
    fn upgrade(
        &self,
        stream: BoxedStream,
        host: &str,
    ) -> impl Future<Output = Result<BoxedStream>> + Send;
}

/// Connects over TCP, verifying servers against the webpki root store.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
    tls: Arc<ClientConfig>,
}

impl TcpConnector {
    /// Creates a connector with the given connect timeout.
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            tls: tls_client_config(),
        }
    }

    async fn open_tcp(&self, endpoint: &Endpoint) -> Result<TcpStream> {
        let addr = endpoint.address();
        let connection_error = |source| Error::Connection {
            endpoint: addr.clone(),
            source,
        };

        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(err)) => Err(connection_error(err)),
            Err(_) => Err(connection_error(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no connection within {:?}", self.connect_timeout),
            ))),
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<BoxedStream> {
        let tcp = self.open_tcp(endpoint).await?;
        match endpoint.security {
            SecurityMode::Plain | SecurityMode::StartTls => Ok(Box::new(tcp)),
            SecurityMode::ImplicitTls => {
                let server_name = server_name(&endpoint.host)?;
                let tls = TlsConnector::from(Arc::clone(&self.tls))
                    .connect(server_name, tcp)
                    .await
                    .map_err(|source| Error::Connection {
                        endpoint: endpoint.address(),
                        source,
                    })?;
                Ok(Box::new(tls))
            }
        }
    }

    async fn upgrade(&self, stream: BoxedStream, host: &str) -> Result<BoxedStream> {
        let server_name = server_name(host)?;
        let tls = TlsConnector::from(Arc::clone(&self.tls))
            .connect(server_name, stream)
            .await
            .map_err(|err| Error::Tls(err.to_string()))?;
        Ok(Box::new(tls))
    }
}

fn server_name(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|_| Error::Tls(format!("invalid server name: {host}")))
}

/// Creates a TLS client configuration with the webpki root certificates.
fn tls_client_config() -> Arc<ClientConfig> {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}
