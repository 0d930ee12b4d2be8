use reqwest::header::HeaderValue;
use thiserror::Error;

/// Failures reported by the HTTP boundary.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("HTTP status {0}")]
    Status(u16),
}

/// The transport boundary: one blocking round trip per call.
///
/// Profile records hold a transport behind this trait so that tests can
/// substitute a canned implementation; the service only ever sees
/// [`HttpTransport`].
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &str) -> std::result::Result<String, TransportError>;
}

#[derive(Debug, Default)]
pub struct HttpTransport;

impl HttpTransport {
    async fn get(url: &str) -> std::result::Result<String, TransportError> {
        let mut header = reqwest::header::HeaderMap::new();
        header.insert(
            "User-Agent",
            HeaderValue::from_static(
                "Mozilla/5.0 (X11; Linux x86_64; rv:102.0) Gecko/20100101 Firefox/102.0",
            ),
        );
        let client = reqwest::Client::builder()
            .default_headers(header)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> std::result::Result<String, TransportError> {
        log::trace!("GET {}", url);
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        runtime.block_on(Self::get(url))
    }
}
