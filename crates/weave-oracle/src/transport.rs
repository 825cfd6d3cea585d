use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;

use crate::error::OracleError;

/// Where the state oracle listens and how long one round trip may take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleEndpoint {
    pub host: String,
    pub port: u16,
    /// Upper bound on connect + send + receive for one submission.
    pub timeout_ms: u64,
}

impl Default for OracleEndpoint {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 2023,
            timeout_ms: 30_000,
        }
    }
}

impl OracleEndpoint {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A request/response exchange with the oracle: one JSON body in, one out.
pub trait OracleTransport {
    fn execute(&mut self, body: &str) -> Result<String, OracleError>;
}

impl<T: OracleTransport + ?Sized> OracleTransport for Box<T> {
    fn execute(&mut self, body: &str) -> Result<String, OracleError> {
        (**self).execute(body)
    }
}

/// HTTP/1.1 `POST /execute` against the oracle server.
///
/// The exploration loop is synchronous, so each call blocks on a private
/// current-thread runtime. Must not be called from inside another tokio
/// runtime.
pub struct HttpTransport {
    endpoint: OracleEndpoint,
    runtime: Runtime,
}

impl HttpTransport {
    pub fn new(endpoint: OracleEndpoint) -> Result<Self, OracleError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;
        Ok(Self { endpoint, runtime })
    }

    pub fn endpoint(&self) -> &OracleEndpoint {
        &self.endpoint
    }
}

impl OracleTransport for HttpTransport {
    fn execute(&mut self, body: &str) -> Result<String, OracleError> {
        let timeout = self.endpoint.timeout();
        let endpoint = &self.endpoint;
        self.runtime.block_on(async {
            match tokio::time::timeout(timeout, post_execute(endpoint, body)).await {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout(timeout)),
            }
        })
    }
}

async fn post_execute(endpoint: &OracleEndpoint, body: &str) -> Result<String, OracleError> {
    let mut stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;

    let head = format!(
        "POST /execute HTTP/1.1\r\n\
         Host: {}:{}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        endpoint.host,
        endpoint.port,
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.flush().await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    parse_http_response(&raw)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Extract the body of a complete HTTP/1.1 response.
///
/// Non-2xx statuses are errors. Supports `Content-Length`, chunked transfer
/// encoding, and bodies delimited by connection close.
pub fn parse_http_response(raw: &[u8]) -> Result<String, OracleError> {
    let split = find(raw, b"\r\n\r\n")
        .ok_or_else(|| OracleError::Http("missing header terminator".to_string()))?;
    let head = std::str::from_utf8(&raw[..split])
        .map_err(|_| OracleError::Http("headers are not UTF-8".to_string()))?;
    let payload = &raw[split + 4..];

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or_default();
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| OracleError::Http(format!("bad status line '{status_line}'")))?;

    let mut content_length = None;
    let mut chunked = false;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            let len: usize = value
                .parse()
                .map_err(|_| OracleError::Http(format!("bad Content-Length '{value}'")))?;
            content_length = Some(len);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.to_ascii_lowercase().contains("chunked");
        }
    }

    let body = if chunked {
        decode_chunked(payload)?
    } else if let Some(len) = content_length {
        if payload.len() < len {
            return Err(OracleError::Http(format!(
                "body truncated: {} of {} bytes",
                payload.len(),
                len
            )));
        }
        payload[..len].to_vec()
    } else {
        payload.to_vec()
    };

    let body = String::from_utf8(body)
        .map_err(|_| OracleError::Http("body is not UTF-8".to_string()))?;

    if !(200..300).contains(&status) {
        return Err(OracleError::Status { status, body });
    }
    Ok(body)
}

fn decode_chunked(mut payload: &[u8]) -> Result<Vec<u8>, OracleError> {
    let mut out = Vec::new();
    loop {
        let line_end = find(payload, b"\r\n")
            .ok_or_else(|| OracleError::Http("unterminated chunk size".to_string()))?;
        let size_line = std::str::from_utf8(&payload[..line_end])
            .map_err(|_| OracleError::Http("chunk size is not UTF-8".to_string()))?;
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| OracleError::Http(format!("bad chunk size '{size_hex}'")))?;
        payload = &payload[line_end + 2..];

        if size == 0 {
            return Ok(out);
        }
        if payload.len() < size {
            return Err(OracleError::Http("chunk truncated".to_string()));
        }
        out.extend_from_slice(&payload[..size]);
        payload = payload.get(size + 2..).unwrap_or_default();
    }
}
