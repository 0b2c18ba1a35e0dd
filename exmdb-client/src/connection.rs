//! Connection management.
//!
//! A [`Connection`] owns one TCP stream and runs strictly synchronous
//! request/response cycles over it. There is no pipelining and no background
//! task; callers needing parallelism open one connection per worker.

use crate::config::ClientConfig;
use crate::error::ClientError;
use bytes::Bytes;
use exmdb_protocol::{
    Buffer, Request, ResponseCode, ResponseHeader, WStringEncoding, RESPONSE_HEADER_SIZE,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// How long a lone error code byte waits for the rest of its header.
const CODE_ONLY_GRACE: Duration = Duration::from_millis(100);

/// A response as read off the wire, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Response code byte.
    pub code: u8,
    /// Payload following the header; `None` for code-only replies.
    pub payload: Option<Bytes>,
}

impl RawResponse {
    pub fn is_code_only(&self) -> bool {
        self.payload.is_none()
    }

    pub fn is_success(&self) -> bool {
        self.code == ResponseCode::Success.code()
    }
}

/// A connection to an exmdb server.
pub struct Connection {
    addr: String,
    stream: Option<TcpStream>,
    wstring: WStringEncoding,
    request_timeout: Duration,
    /// Set while a request is on the wire; still set if the send future was dropped.
    in_flight: bool,
    poisoned: bool,
}

impl Connection {
    /// Opens a TCP connection to the configured server.
    pub async fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let addr = config.addr();
        tracing::debug!("Connecting to {}...", addr);

        let stream = tokio::time::timeout(config.connect_timeout(), TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                tracing::debug!("Connection timeout");
                ClientError::Timeout
            })?
            .map_err(|e| {
                tracing::debug!("Connection failed: {}", e);
                ClientError::Io(e)
            })?;

        stream.set_nodelay(true).ok();
        tracing::debug!("TCP connected to {}", addr);

        Ok(Self {
            addr,
            stream: Some(stream),
            wstring: config.wstring_encoding(),
            request_timeout: config.request_timeout(),
            in_flight: false,
            poisoned: false,
        })
    }

    /// Returns the server address this connection was opened to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn wstring_encoding(&self) -> WStringEncoding {
        self.wstring
    }

    /// Returns whether the connection is unusable.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned || self.in_flight
    }

    /// Sends a request and decodes its response.
    ///
    /// Any non-`SUCCESS` response code yields [`ClientError::Mapi`]. A
    /// code-only `SUCCESS` reply is decoded as an empty payload.
    pub async fn send<R: Request>(&mut self, request: &R) -> Result<R::Response, ClientError> {
        let frame = request.serialize_with(self.wstring)?;
        let raw = self.send_raw(&frame, R::NAME).await?;

        if !raw.is_success() {
            tracing::debug!(
                "{} failed with {} ({:#04x})",
                R::NAME,
                ResponseCode::name_of(raw.code),
                raw.code
            );
            return Err(ClientError::mapi(raw.code));
        }

        let payload = raw.payload.unwrap_or_default();
        let mut buf = Buffer::from_slice(&payload, self.wstring);
        Ok(R::parse_response(&mut buf)?)
    }

    /// Writes an already-framed request and reads the raw response.
    ///
    /// Any transmission failure, timeout or interrupted cycle poisons the
    /// connection; later calls fail with [`ClientError::Poisoned`]. So does a
    /// code-only error reply, since its stream position cannot be trusted.
    pub async fn send_raw(&mut self, frame: &[u8], name: &str) -> Result<RawResponse, ClientError> {
        if self.in_flight {
            self.poison("previous request was interrupted");
        }
        if self.poisoned {
            return Err(ClientError::Poisoned);
        }

        self.in_flight = true;
        let timeout = self.request_timeout;
        let result = match tokio::time::timeout(timeout, self.exchange(frame, name)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        };

        match result {
            Ok(raw) => {
                self.in_flight = false;
                Ok(raw)
            }
            Err(e) => {
                self.poison(&e.to_string());
                Err(e)
            }
        }
    }

    async fn exchange(&mut self, frame: &[u8], name: &str) -> Result<RawResponse, ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        stream.write_all(frame).await?;
        tracing::debug!("{} sent ({} bytes), waiting for response...", name, frame.len());

        let mut header = [0u8; RESPONSE_HEADER_SIZE];
        let mut read = 0;
        while read < RESPONSE_HEADER_SIZE {
            // Error replies may consist of the code byte alone
            let n = if read == 1 && header[0] != ResponseCode::Success.code() {
                let rest = stream.read(&mut header[read..]);
                match tokio::time::timeout(CODE_ONLY_GRACE, rest).await {
                    Ok(n) => n?,
                    Err(_) => break,
                }
            } else {
                stream.read(&mut header[read..]).await?
            };
            if n == 0 {
                break;
            }
            read += n;
        }

        match read {
            0 => {
                tracing::debug!("Connection closed (0 bytes)");
                return Err(ClientError::ConnectionClosed {
                    read: 0,
                    expected: RESPONSE_HEADER_SIZE,
                });
            }
            1 => {
                tracing::debug!("{} got code-only response {:#04x}", name, header[0]);
                // A late length field would desynchronize the next cycle
                self.poison("code-only response");
                return Ok(RawResponse {
                    code: header[0],
                    payload: None,
                });
            }
            n if n < RESPONSE_HEADER_SIZE => {
                tracing::debug!("Connection closed after {} header bytes", n);
                return Err(ClientError::ConnectionClosed {
                    read: n,
                    expected: RESPONSE_HEADER_SIZE,
                });
            }
            _ => {}
        }

        let header = ResponseHeader::parse(&header);
        header.validate()?;

        let expected = header.length as usize;
        let mut payload = vec![0u8; expected];
        let mut received = 0;
        while received < expected {
            let n = stream.read(&mut payload[received..]).await?;
            if n == 0 {
                tracing::debug!("Connection closed after {}/{} payload bytes", received, expected);
                return Err(ClientError::ConnectionClosed {
                    read: received,
                    expected,
                });
            }
            received += n;
        }

        tracing::debug!(
            "{} got response {:#04x} with {} payload bytes",
            name,
            header.code,
            expected
        );
        Ok(RawResponse {
            code: header.code,
            payload: Some(Bytes::from(payload)),
        })
    }

    fn poison(&mut self, reason: &str) {
        if !self.poisoned {
            tracing::warn!("Connection to {} poisoned: {}", self.addr, reason);
        }
        self.poisoned = true;
        self.in_flight = false;
        self.stream = None;
    }

    /// Closes the connection.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!("Closing connection to {}", self.addr);
            let _ = stream.shutdown().await;
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("addr", &self.addr)
            .field("open", &self.stream.is_some())
            .field("wstring", &self.wstring)
            .field("poisoned", &self.is_poisoned())
            .finish()
    }
}
