//! HTTP transport used for discovery probes.
//!
//! The probe loop talks to the network through the [`Transport`] trait
//! so that TLS policy is an explicit per-client capability and tests
//! can substitute a scripted transport. [`HttpTransport`] is the
//! default implementation: one HTTP/1 connection per request, no
//! redirect following, per-request connect/read/write timeouts. There
//! is no overall deadline across the requests of one discovery call.

use std::pin::Pin;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use async_native_tls::{Protocol, TlsConnector, TlsStream};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_io_timeout::TimeoutStream;

/// Connection, write and read timeout per request.
const TIMEOUT: Duration = Duration::from_secs(60);

/// A single HTTP response, reduced to what discovery consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,

    /// Last `Location` header, if any.
    pub location: Option<String>,

    /// Raw response body.
    pub body: Vec<u8>,
}

/// Issues single HTTP requests on behalf of the discovery loop.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Performs one GET request without following redirects.
    ///
    /// `authorization` is placed into the `Authorization` header
    /// verbatim when given. `body`, when given, is sent as the request
    /// body; Autodiscover uses GET-with-body on the wire, so the
    /// transport must not silently drop it.
    async fn get(
        &self,
        url: &str,
        authorization: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<Response>;
}

trait SessionStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> SessionStream for T {}

/// Default [`Transport`] on top of hyper and native TLS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    strict_tls: bool,
}

impl HttpTransport {
    /// Creates a transport that verifies server certificates.
    pub fn new() -> Self {
        Self { strict_tls: true }
    }

    /// Creates a transport that accepts invalid certificates and
    /// hostnames.
    ///
    /// Autodiscover endpoints are frequently served under certificates
    /// that do not cover the probed hostname, so callers may opt into
    /// this mode per transport instead of process-wide.
    pub fn insecure() -> Self {
        Self { strict_tls: false }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        authorization: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let parsed_url = url
            .parse::<hyper::Uri>()
            .with_context(|| format!("failed to parse URL {url:?}"))?;
        let scheme = parsed_url.scheme_str().context("URL has no scheme")?;
        let host = parsed_url.host().context("URL has no host")?.to_string();
        let authority = parsed_url
            .authority()
            .context("URL has no authority")?
            .clone();

        let stream: Box<dyn SessionStream> = match scheme {
            "http" => {
                let port = parsed_url.port_u16().unwrap_or(80);
                Box::new(connect_tcp(&host, port).await?)
            }
            "https" => {
                let port = parsed_url.port_u16().unwrap_or(443);
                let tcp_stream = connect_tcp(&host, port).await?;
                Box::new(wrap_tls(self.strict_tls, &host, tcp_stream).await?)
            }
            _ => bail!("unknown URL scheme {scheme:?}"),
        };

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
        tokio::task::spawn(conn);

        let mut request = hyper::Request::builder()
            .method(hyper::Method::GET)
            .uri(request_target(&parsed_url))
            .header(hyper::header::HOST, authority.as_str());
        if let Some(authorization) = authorization {
            request = request.header(hyper::header::AUTHORIZATION, authorization);
        }
        let request = request.body(Full::new(Bytes::from(body.unwrap_or_default())))?;

        let response = sender.send_request(request).await?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get_all(hyper::header::LOCATION)
            .iter()
            .last()
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body = response.collect().await?.to_bytes().to_vec();

        Ok(Response {
            status,
            location,
            body,
        })
    }
}

/// Origin-form request target: the path plus any query string.
///
/// Redirect-resolved candidates may carry a query in their `Location`
/// target, so the query must survive into the request line.
fn request_target(parsed_url: &hyper::Uri) -> &str {
    parsed_url
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str())
        .unwrap_or_else(|| parsed_url.path())
}

/// Returns a TCP connection with read/write timeouts set and Nagle's
/// algorithm disabled with `TCP_NODELAY`.
async fn connect_tcp(host: &str, port: u16) -> Result<Pin<Box<TimeoutStream<TcpStream>>>> {
    let tcp_stream = timeout(TIMEOUT, TcpStream::connect((host, port)))
        .await
        .context("connection timeout")?
        .context("connection failure")?;

    // Disable Nagle's algorithm.
    tcp_stream.set_nodelay(true)?;

    let mut timeout_stream = TimeoutStream::new(tcp_stream);
    timeout_stream.set_write_timeout(Some(TIMEOUT));
    timeout_stream.set_read_timeout(Some(TIMEOUT));

    Ok(Box::pin(timeout_stream))
}

async fn wrap_tls<T: AsyncRead + AsyncWrite + Unpin>(
    strict_tls: bool,
    hostname: &str,
    stream: T,
) -> Result<TlsStream<T>> {
    let tls_builder = TlsConnector::new().min_protocol_version(Some(Protocol::Tlsv12));
    let tls = if strict_tls {
        tls_builder
    } else {
        tls_builder
            .danger_accept_invalid_hostnames(true)
            .danger_accept_invalid_certs(true)
    };
    let tls_stream = tls.connect(hostname, stream).await?;
    Ok(tls_stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_target_keeps_query() {
        let uri: hyper::Uri = "https://mail.example.org/autodiscover/autodiscover.xml?realm=x"
            .parse()
            .unwrap();
        assert_eq!(
            request_target(&uri),
            "/autodiscover/autodiscover.xml?realm=x"
        );

        let uri: hyper::Uri = "https://mail.example.org/autodiscover/autodiscover.xml"
            .parse()
            .unwrap();
        assert_eq!(request_target(&uri), "/autodiscover/autodiscover.xml");
    }
}
