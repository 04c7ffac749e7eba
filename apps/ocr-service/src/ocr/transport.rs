//! HTTP transport for OCR requests
//!
//! Separates the single form POST from the retry policy so the policy can be
//! exercised without a network.

use std::error::Error as StdError;
use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Raw HTTP outcome of one attempt
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and connection failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() || (err.is_request() && is_connection_dropped(&err)) {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Peer closed or reset the connection after it was established
fn is_connection_dropped(err: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_canceled() {
                return true;
            }
        }
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            if matches!(
                io_err.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

#[async_trait]
pub trait OcrTransport: Send + Sync {
    /// POST a form-encoded body and return status plus body text
    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
///
/// Builds a fresh client per call so no connection state is shared between
/// requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    connect_timeout: Duration,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            connect_timeout,
            timeout,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), Duration::from_secs(45))
    }
}

#[async_trait]
impl OcrTransport for ReqwestTransport {
    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
    ) -> Result<TransportResponse, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let response = client.post(url).form(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::Timeout("read".into()).is_retryable());
        assert!(TransportError::Connect("refused".into()).is_retryable());
        assert!(!TransportError::Other("bad request".into()).is_retryable());
    }

    /// Listener that accepts every connection and closes it without replying
    async fn spawn_dropping_listener() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_dropped_connection_is_retryable() {
        let addr = spawn_dropping_listener().await;
        let transport = ReqwestTransport::new(Duration::from_secs(2), Duration::from_secs(5));

        let result = transport
            .post_form(&format!("http://{}/parse/image", addr), &[("apikey", "x".to_string())])
            .await;

        match result {
            Err(err) => assert!(err.is_retryable(), "unexpected error: {:?}", err),
            Ok(response) => panic!("unexpected response with status {}", response.status),
        }
    }

    #[test]
    fn test_reset_in_source_chain_counts_as_dropped() {
        let reset = std::io::Error::new(ErrorKind::ConnectionReset, "connection reset by peer");
        assert!(is_connection_dropped(&reset));

        let refused_elsewhere = std::io::Error::new(ErrorKind::InvalidData, "bad frame");
        assert!(!is_connection_dropped(&refused_elsewhere));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connect_error() {
        // Port 9 on localhost (discard) is not expected to be listening
        let transport = ReqwestTransport::new(Duration::from_secs(2), Duration::from_secs(5));
        let result = transport
            .post_form("http://127.0.0.1:9/parse/image", &[("apikey", "x".to_string())])
            .await;

        match result {
            Err(err) => assert!(err.is_retryable(), "unexpected error: {}", err),
            Ok(response) => panic!("unexpected response with status {}", response.status),
        }
    }
}
