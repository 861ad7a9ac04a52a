//! Wire protocol.
//!
//! Framing is newline-delimited: each line is one JSON object carrying a
//! `type` discriminator; empty lines are ignored. JSON string escaping
//! guarantees a framed message never contains a raw newline byte.
//!
//! [`LineConn`] wraps a tokio `TcpStream` for the polled, non-blocking model
//! both sides use: `WouldBlock` means "nothing this tick", a zero-length read
//! means the peer closed, and a malformed line is dropped without touching
//! the rest of the buffered stream.

use std::collections::VecDeque;
use std::io;

use anyhow::Context;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tracing::warn;

use crate::ecs::PlayerId;

/// Per-player entry in a `state` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
}

/// High-level message envelope, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NetMsg {
    /// Server -> client, once, immediately after accept. World bounds are
    /// present only when the server has them configured.
    Welcome {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        world_width: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        world_height: Option<f32>,
    },
    /// Client -> server, every tick. Missing axes coerce to zero.
    Input {
        #[serde(default)]
        move_x: f32,
        #[serde(default)]
        move_y: f32,
    },
    /// Server -> client, every tick: one entry per active connection.
    State { players: Vec<PlayerState> },
    /// Client -> server without `from`; relayed server -> client with the
    /// sender's player id filled in.
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<PlayerId>,
        text: String,
    },
}

/// Serializes a message and appends the frame delimiter.
pub fn encode_line(msg: &NetMsg) -> anyhow::Result<Vec<u8>> {
    let mut buf = serde_json::to_vec(msg).context("serialize msg")?;
    buf.push(b'\n');
    Ok(buf)
}

/// Decodes one frame (without its delimiter).
pub fn decode_line(line: &[u8]) -> anyhow::Result<NetMsg> {
    serde_json::from_slice(line).context("deserialize msg")
}

/// Inbound byte accumulator that splits the stream on newline frames.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete line, delimiter stripped.
    /// Empty lines are skipped; an incomplete trailing fragment stays
    /// buffered for the next read.
    pub fn next_line(&mut self) -> Option<BytesMut> {
        loop {
            let pos = self.buf.iter().position(|&b| b == b'\n')?;
            let mut line = self.buf.split_to(pos + 1);
            line.truncate(pos);
            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    /// Bytes currently buffered, including any trailing fragment.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Result of one non-blocking read pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStatus {
    Open,
    /// The peer closed the stream (zero-length read).
    Closed,
}

/// Newline-framed message stream over a non-blocking TCP socket.
#[derive(Debug)]
pub struct LineConn {
    stream: TcpStream,
    inbox: LineBuffer,
    pending: VecDeque<NetMsg>,
}

impl LineConn {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            inbox: LineBuffer::default(),
            pending: VecDeque::new(),
        }
    }

    /// One non-blocking read pass. Complete lines are decoded into the
    /// internal queue; malformed lines are logged and dropped. `WouldBlock`
    /// is not an error, it simply ends the pass.
    pub fn poll(&mut self) -> io::Result<ConnStatus> {
        let mut chunk = [0u8; 4096];
        let status = loop {
            match self.stream.try_read(&mut chunk) {
                Ok(0) => break ConnStatus::Closed,
                Ok(n) => self.inbox.extend(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break ConnStatus::Open,
                Err(e) => return Err(e),
            }
        };

        while let Some(line) = self.inbox.next_line() {
            match decode_line(&line) {
                Ok(msg) => self.pending.push_back(msg),
                Err(e) => warn!(error = %e, "dropping malformed line"),
            }
        }
        Ok(status)
    }

    /// Pops the next decoded message, if any. Pair with [`LineConn::poll`].
    pub fn try_recv(&mut self) -> Option<NetMsg> {
        self.pending.pop_front()
    }

    /// Waits for the next message. Used outside the tick loop (the client
    /// handshake); the server only ever polls.
    pub async fn recv(&mut self) -> anyhow::Result<NetMsg> {
        loop {
            if let Some(msg) = self.pending.pop_front() {
                return Ok(msg);
            }
            match self.poll().context("tcp read")? {
                ConnStatus::Closed if self.pending.is_empty() => {
                    anyhow::bail!("connection closed")
                }
                ConnStatus::Closed => {}
                ConnStatus::Open => {
                    self.stream.readable().await.context("await readable")?;
                }
            }
        }
    }

    /// Frames and writes a message. A short write or `WouldBlock` counts as
    /// a send failure; callers drop the connection rather than wait on it.
    pub fn send(&mut self, msg: &NetMsg) -> anyhow::Result<()> {
        let bytes = encode_line(msg)?;
        self.send_bytes(&bytes)
    }

    /// Writes pre-framed bytes, e.g. a broadcast serialized once.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        let mut written = 0;
        while written < bytes.len() {
            match self.stream.try_write(&bytes[written..]) {
                Ok(0) => anyhow::bail!("connection closed during write"),
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    anyhow::bail!("send buffer full")
                }
                Err(e) => return Err(e).context("tcp write"),
            }
        }
        Ok(())
    }
}
