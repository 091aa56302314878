use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::app::Application;
use crate::config::Limits;
use crate::http::parser::{HeaderTerminator, parse_head};
use crate::http::request::{Method, Request};
use crate::http::response::{Canned, StatusCode};
use crate::http::writer::ResponseWriter;

/// One client connection, serving exactly one request.
///
/// Generic over the stream so the state machine can be driven by a
/// `TcpStream` in production and an in-memory duplex pipe in tests.
pub struct Connection<S> {
    stream: S,
    peer: String,
    app: Arc<Application>,
    limits: Limits,
    buffer: BytesMut,
    terminator: HeaderTerminator,
    state: ConnectionState,
}

pub enum ConnectionState {
    /// Filling the header buffer until the blank line shows up.
    ReadingHeader,
    /// The header block is the first `usize` bytes of the buffer.
    HeaderComplete(usize),
    /// Collecting the rest of a `Content-Length` body into the buffer.
    ReadingBody { request: Request },
    Dispatching(Request),
    Writing(ResponseWriter, AccessLog),
    Closed,
}

/// What gets logged once a response is on the wire.
pub struct AccessLog {
    method: Option<Method>,
    url: Option<String>,
    status: StatusCode,
}

impl AccessLog {
    fn new(request: Option<&Request>, status: StatusCode) -> Self {
        Self {
            method: request.map(|r| r.method),
            url: request.map(|r| r.url.clone()),
            status,
        }
    }
}

enum ReadOutcome {
    Data,
    Eof,
    TimedOut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>, app: Arc<Application>, limits: Limits) -> Self {
        Self {
            stream,
            peer: peer.into(),
            app,
            limits,
            buffer: BytesMut::with_capacity(limits.max_header_size.min(4096)),
            terminator: HeaderTerminator::new(),
            state: ConnectionState::ReadingHeader,
        }
    }

    /// Drives the connection to completion.
    ///
    /// Protocol errors are answered with an error status. An `Err` means the
    /// socket itself failed; the caller only has to drop the connection.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::ReadingHeader => self.read_header().await?,
                ConnectionState::HeaderComplete(head_len) => self.parse_header(head_len),
                ConnectionState::ReadingBody { request } => self.read_body(request).await?,
                ConnectionState::Dispatching(request) => {
                    let reply = self.app.dispatch(&request);
                    let log = AccessLog::new(Some(&request), reply.status());
                    ConnectionState::Writing(reply.into_writer(), log)
                }
                ConnectionState::Writing(mut writer, log) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    tracing::info!(
                        peer = %self.peer,
                        method = log.method.map_or("-", |m| m.as_str()),
                        url = log.url.as_deref().unwrap_or("-"),
                        status = log.status.as_u16(),
                        "Request served"
                    );
                    ConnectionState::Closed
                }
                ConnectionState::Closed => break,
            };
        }

        // The peer may already be gone; closing is best effort.
        let _ = self.stream.shutdown().await;
        Ok(())
    }

    async fn read_header(&mut self) -> anyhow::Result<ConnectionState> {
        let room = self.limits.max_header_size.saturating_sub(self.buffer.len());
        if room == 0 {
            return Ok(self.reject(Canned::HeaderFieldsTooLarge, None));
        }

        match self.read_limited(room).await? {
            ReadOutcome::Eof => {
                if !self.buffer.is_empty() {
                    tracing::debug!(peer = %self.peer, "Peer closed inside header block");
                }
                return Ok(ConnectionState::Closed);
            }
            ReadOutcome::TimedOut => return Ok(self.reject(Canned::RequestTimeout, None)),
            ReadOutcome::Data => {}
        }

        Ok(match self.terminator.scan(&self.buffer) {
            Some(head_len) => ConnectionState::HeaderComplete(head_len),
            None if self.buffer.len() >= self.limits.max_header_size => {
                self.reject(Canned::HeaderFieldsTooLarge, None)
            }
            None => ConnectionState::ReadingHeader,
        })
    }

    fn parse_header(&mut self, head_len: usize) -> ConnectionState {
        let head = self.buffer.split_to(head_len);

        let request = match parse_head(&head) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "Rejecting malformed header block");
                return self.reject(Canned::LengthRequired, None);
            }
        };

        if request.content_length() > self.limits.max_body_size {
            return self.reject(Canned::PayloadTooLarge, Some(&request));
        }

        // Whatever followed the blank line in the same reads stays in the
        // buffer as the start of the body.
        ConnectionState::ReadingBody { request }
    }

    async fn read_body(&mut self, mut request: Request) -> anyhow::Result<ConnectionState> {
        let remaining = request.content_length().saturating_sub(self.buffer.len());

        if remaining > 0 {
            return Ok(match self.read_limited(remaining).await? {
                ReadOutcome::Data => ConnectionState::ReadingBody { request },
                ReadOutcome::Eof => {
                    tracing::debug!(
                        peer = %self.peer,
                        expected = request.content_length(),
                        received = self.buffer.len(),
                        "Peer closed before body was complete"
                    );
                    ConnectionState::Closed
                }
                ReadOutcome::TimedOut => self.reject(Canned::RequestTimeout, Some(&request)),
            });
        }

        let body = self.buffer.split().to_vec();
        match request.attach_body(body) {
            Ok(()) => Ok(ConnectionState::Dispatching(request)),
            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "Rejecting undecodable body");
                Ok(self.reject(Canned::BadRequest, Some(&request)))
            }
        }
    }

    /// Appends at most `limit` bytes from the stream to `self.buffer`.
    async fn read_limited(&mut self, limit: usize) -> anyhow::Result<ReadOutcome> {
        self.buffer.reserve(limit.min(64 * 1024));

        let mut reader = (&mut self.stream).take(limit as u64);
        let read = reader.read_buf(&mut self.buffer);
        let n = match with_timeout(self.limits, read).await {
            Some(n) => n?,
            None => {
                tracing::debug!(peer = %self.peer, "Read timed out");
                return Ok(ReadOutcome::TimedOut);
            }
        };

        Ok(if n == 0 { ReadOutcome::Eof } else { ReadOutcome::Data })
    }

    fn reject(&self, canned: Canned, request: Option<&Request>) -> ConnectionState {
        ConnectionState::Writing(
            ResponseWriter::from_bytes(canned.bytes()),
            AccessLog::new(request, canned.status()),
        )
    }
}

async fn with_timeout<F: Future>(limits: Limits, fut: F) -> Option<F::Output> {
    match limits.read_timeout {
        Some(duration) => tokio::time::timeout(duration, fut).await.ok(),
        None => Some(fut.await),
    }
}
