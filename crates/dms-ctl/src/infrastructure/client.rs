//! TCP connection to the display manager service.
//!
//! TCP is a stream protocol, so replies are reassembled with
//! [`FrameBuffer`]: one read may carry half a frame or several frames.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use dms_core::protocol::{encode_frame, CodecError, FrameBuffer};
use dms_core::{ChangeEvent, DmError, ListenerKind, Request, Response};

const READ_CHUNK: usize = 8192;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Codec(#[from] CodecError),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("service closed the connection")]
    Closed,

    #[error("subscription rejected: {0}")]
    Rejected(DmError),

    #[error("unexpected response: {0:?}")]
    Unexpected(Box<Response>),
}

/// One connection to the service.
///
/// Requests are answered in the order they were sent, so a plain
/// write-then-read is enough for request/response use.
pub struct DmsClient {
    stream: TcpStream,
    frames: FrameBuffer,
    request_timeout: Duration,
}

impl DmsClient {
    pub async fn connect(addr: SocketAddr, request_timeout: Duration) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::Connect { addr, source })?;
        debug!(%addr, "connected to display manager service");
        Ok(Self {
            stream,
            frames: FrameBuffer::new(),
            request_timeout,
        })
    }

    /// Sends `request` and waits for its response.
    pub async fn request(&mut self, request: &Request) -> Result<Response, ClientError> {
        self.send(request).await?;
        let limit = self.request_timeout;
        timeout(limit, self.read_response())
            .await
            .map_err(|_| ClientError::Timeout(limit))?
    }

    /// Registers `agent` for `kinds`.  After this the connection only
    /// carries events; read them with [`DmsClient::next_event`].
    pub async fn subscribe(
        &mut self,
        agent: Uuid,
        kinds: Vec<ListenerKind>,
    ) -> Result<(), ClientError> {
        match self.request(&Request::Subscribe { agent, kinds }).await? {
            Response::Status(Ok(())) => Ok(()),
            Response::Status(Err(e)) => Err(ClientError::Rejected(e)),
            other => Err(ClientError::Unexpected(Box::new(other))),
        }
    }

    /// Waits for the next streamed event.  Returns `Ok(None)` once the
    /// service closes the connection.
    pub async fn next_event(&mut self) -> Result<Option<ChangeEvent>, ClientError> {
        match self.read_response().await {
            Ok(Response::Event(event)) => Ok(Some(event)),
            Ok(other) => Err(ClientError::Unexpected(Box::new(other))),
            Err(ClientError::Closed) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send(&mut self, request: &Request) -> Result<(), ClientError> {
        let bytes = encode_frame(request)?;
        self.stream.write_all(&bytes).await?;
        Ok(())
    }

    async fn read_response(&mut self) -> Result<Response, ClientError> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            if let Some(response) = self.frames.next_frame::<Response>()? {
                return Ok(response);
            }
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(ClientError::Closed);
            }
            self.frames.push(&buf[..n]);
        }
    }
}
