//! Client implementation.
//!
//! The client maintains:
//! - One newline-framed TCP stream to the server
//! - Per-tick `input` sending (callers send every tick, zero intent included)
//! - A mirror world reconciled against each `state` snapshot
//! - A bounded chat log
//!
//! Loss of the connection is terminal for the session; reconnecting means a
//! brand-new session with a new player id.

use std::net::SocketAddr;

use anyhow::Context;
use arena_shared::{
    config::ServerConfig,
    ecs::PlayerId,
    net::{ConnStatus, LineConn, NetMsg},
};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::chat::ChatLog;
use crate::mirror::MirrorWorld;

/// Chat lines kept before the oldest falls off.
const CHAT_LOG_CAPACITY: usize = 64;

/// Client session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    /// Read error or stream closed; terminal.
    Disconnected,
}

/// High-level game client.
pub struct GameClient {
    pub player_id: PlayerId,
    pub state: SessionState,
    /// World bounds from the welcome message, if the server sent them.
    pub world_bounds: Option<(f32, f32)>,
    pub chat: ChatLog,
    conn: LineConn,
    mirror: MirrorWorld,
}

impl GameClient {
    /// Connects to the server and waits for the `welcome` message.
    pub async fn connect(cfg: &ServerConfig) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.listen_addr.parse().context("parse listen_addr")?;
        info!(server = %addr, "connecting to server");

        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        let _ = stream.set_nodelay(true);
        let mut conn = LineConn::new(stream);

        let welcome = conn.recv().await.context("await welcome")?;
        let (player_id, world_bounds) = match welcome {
            NetMsg::Welcome {
                player_id,
                world_width,
                world_height,
            } => (player_id, world_width.zip(world_height)),
            other => anyhow::bail!("expected welcome, got {other:?}"),
        };

        info!(player_id = player_id.0, "connected to server");

        Ok(Self {
            player_id,
            state: SessionState::Connected,
            world_bounds,
            chat: ChatLog::new(CHAT_LOG_CAPACITY),
            conn,
            mirror: MirrorWorld::default(),
        })
    }

    /// Sends one tick's movement intent.
    pub fn send_input(&mut self, move_x: f32, move_y: f32) -> anyhow::Result<()> {
        self.conn.send(&NetMsg::Input { move_x, move_y })
    }

    /// Sends a chat line; the server relays it to everyone else.
    pub fn send_chat(&mut self, text: impl Into<String>) -> anyhow::Result<()> {
        self.conn.send(&NetMsg::Chat {
            from: None,
            text: text.into(),
        })
    }

    /// One non-blocking poll pass: applies snapshots and chat, and marks the
    /// session disconnected when the stream fails or closes.
    pub fn poll(&mut self) {
        let status = match self.conn.poll() {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "lost connection to server");
                self.state = SessionState::Disconnected;
                return;
            }
        };

        while let Some(msg) = self.conn.try_recv() {
            self.apply(msg);
        }

        if status == ConnStatus::Closed {
            info!("server closed the connection");
            self.state = SessionState::Disconnected;
        }
    }

    fn apply(&mut self, msg: NetMsg) {
        match msg {
            NetMsg::State { players } => self.mirror.apply(&players),
            NetMsg::Chat {
                from: Some(from),
                text,
            } => self.chat.push(from, text),
            other => debug!(?other, "unexpected message"),
        }
    }

    /// Last known position of a player in the mirror world.
    pub fn position_of(&self, id: PlayerId) -> Option<(f32, f32)> {
        self.mirror.position_of(id)
    }

    /// The local mirror, for whatever renders it.
    pub fn mirror(&self) -> &MirrorWorld {
        &self.mirror
    }
}
