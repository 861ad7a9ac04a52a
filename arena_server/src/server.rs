//! Authoritative server.
//!
//! A single logical thread of authority owns the world and the connection
//! registry; all simulation state mutates inside the tick loop, strictly
//! ordered: accept, drain, reap, simulate, broadcast, pace. Socket I/O is
//! non-blocking and polled once per tick per connection, so no lock guards
//! the world and no slow client can stall the loop.
//!
//! Determinism notes:
//! - The movement system runs exactly once per tick with a constant `dt`.
//! - Player ids are sequential in acceptance order; spawn positions derive
//!   from the id.
//! - The registry is ordered by player id, so iteration order is stable.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use arena_shared::{
    config::ServerConfig,
    ecs::{EntityId, Input, PlayerId, Position, World, WorldConfig},
    net::{encode_line, ConnStatus, LineConn, NetMsg, PlayerState},
    player::{palette_color, spawn_player},
    systems::movement_system,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long one tick may spend waiting on a pending accept.
const ACCEPT_BUDGET: Duration = Duration::from_millis(1);

/// One registered client connection.
struct ClientConn {
    conn: LineConn,
    peer: SocketAddr,
    /// Entity this connection controls. Left resident after disconnect; the
    /// snapshot filters by live connections, not entity existence.
    entity: EntityId,
    /// Cleared to schedule removal; the reap step applies it.
    alive: bool,
}

/// Authoritative game server.
pub struct GameServer {
    cfg: ServerConfig,
    listener: TcpListener,
    world: World,
    clients: BTreeMap<PlayerId, ClientConn>,
    next_player_id: u32,
    tick: u64,
    shutdown: Arc<AtomicBool>,
}

impl GameServer {
    /// Binds the listener and initializes the world. A bind failure is the
    /// only startup-fatal error.
    pub async fn bind(cfg: ServerConfig) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.listen_addr.parse().context("parse listen_addr")?;
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;

        let mut world = World::default();
        if let Some(bounds) = cfg.world {
            world.set_resource(bounds);
        }

        info!(addr = %listener.local_addr()?, tick_hz = cfg.tick_hz, "world initialized");

        Ok(Self {
            cfg,
            listener,
            world,
            clients: BTreeMap::new(),
            next_player_id: 1,
            tick: 0,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns the local address (after binding).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The shutdown flag; the only state shared with another thread.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Completed tick count.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of registered connections (including ones awaiting reap).
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Entity controlled by a player, while the connection is registered.
    pub fn entity_of(&self, player_id: PlayerId) -> Option<EntityId> {
        self.clients.get(&player_id).map(|c| c.entity)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Runs the tick loop until the shutdown flag is set, then returns,
    /// leaving sockets to close on drop.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let dt = self.cfg.dt();
        let interval = self.cfg.tick_interval();

        while !self.shutdown.load(Ordering::SeqCst) {
            let start = Instant::now();
            self.step(dt).await?;

            // Sleep only the remainder of the budget; an overrun tick is
            // not compensated with catch-up ticks.
            if let Some(rest) = interval.checked_sub(start.elapsed()) {
                tokio::time::sleep(rest).await;
            }
        }

        info!(tick = self.tick, "shutdown requested, stopping");
        Ok(())
    }

    /// Runs a fixed number of paced ticks.
    pub async fn run_for_ticks(&mut self, ticks: u32) -> anyhow::Result<()> {
        let dt = self.cfg.dt();
        let interval = self.cfg.tick_interval();
        for _ in 0..ticks {
            let start = Instant::now();
            self.step(dt).await?;
            if let Some(rest) = interval.checked_sub(start.elapsed()) {
                tokio::time::sleep(rest).await;
            }
        }
        Ok(())
    }

    /// Executes one tick, unpaced.
    pub async fn step(&mut self, dt: f32) -> anyhow::Result<()> {
        self.accept_pending().await;
        self.drain_inputs();
        self.reap();
        movement_system(&mut self.world, dt);
        self.broadcast_state()?;
        self.tick += 1;
        Ok(())
    }

    /// Accepts at most one pending connection, without blocking the tick.
    async fn accept_pending(&mut self) {
        match tokio::time::timeout(ACCEPT_BUDGET, self.listener.accept()).await {
            Ok(Ok((stream, peer))) => self.register(stream, peer),
            Ok(Err(e)) => warn!(error = %e, "accept failed"),
            Err(_) => {} // nothing pending this tick
        }
    }

    /// Allocates the next player id, spawns its entity, and sends `welcome`.
    fn register(&mut self, stream: TcpStream, peer: SocketAddr) {
        let _ = stream.set_nodelay(true);

        let player_id = PlayerId(self.next_player_id);
        self.next_player_id += 1;

        // Deterministic per-id spawn; distinct ids never coincide.
        let spawn_x = 200.0 + (player_id.0 - 1) as f32 * 100.0;
        let spawn_y = 300.0;

        let entity = spawn_player(
            &mut self.world,
            spawn_x,
            spawn_y,
            player_id,
            palette_color(player_id),
        );

        let bounds = self.world.resource::<WorldConfig>();
        let welcome = NetMsg::Welcome {
            player_id,
            world_width: bounds.map(|b| b.width),
            world_height: bounds.map(|b| b.height),
        };

        let mut conn = LineConn::new(stream);
        let alive = match conn.send(&welcome) {
            Ok(()) => true,
            Err(e) => {
                warn!(player_id = player_id.0, error = %e, "failed to send welcome");
                false
            }
        };

        info!(player_id = player_id.0, %peer, "client connected");
        self.clients.insert(
            player_id,
            ClientConn {
                conn,
                peer,
                entity,
                alive,
            },
        );
    }

    /// One non-blocking read pass per connection: `input` overwrites the
    /// entity's intent, `chat` is relayed to every other active connection.
    fn drain_inputs(&mut self) {
        let mut relays: Vec<(PlayerId, String)> = Vec::new();

        for (&player_id, client) in self.clients.iter_mut() {
            if !client.alive {
                continue;
            }

            let status = match client.conn.poll() {
                Ok(status) => status,
                Err(e) => {
                    info!(player_id = player_id.0, error = %e, "client disconnected (read error)");
                    client.alive = false;
                    continue;
                }
            };

            while let Some(msg) = client.conn.try_recv() {
                match msg {
                    NetMsg::Input { move_x, move_y } => {
                        if let Some(intent) = self.world.get_mut::<Input>(client.entity) {
                            intent.move_x = move_x;
                            intent.move_y = move_y;
                        }
                    }
                    NetMsg::Chat { text, .. } => relays.push((player_id, text)),
                    other => debug!(player_id = player_id.0, ?other, "unexpected message"),
                }
            }

            if status == ConnStatus::Closed {
                info!(player_id = player_id.0, "client disconnected (peer closed)");
                client.alive = false;
            }
        }

        for (from, text) in relays {
            self.relay_chat(from, text);
        }
    }

    /// Best-effort chat relay to every active connection except the sender.
    fn relay_chat(&mut self, from: PlayerId, text: String) {
        let msg = NetMsg::Chat {
            from: Some(from),
            text,
        };
        let bytes = match encode_line(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to encode chat relay");
                return;
            }
        };

        for (&player_id, client) in self.clients.iter_mut() {
            if player_id == from || !client.alive {
                continue;
            }
            if let Err(e) = client.conn.send_bytes(&bytes) {
                info!(player_id = player_id.0, error = %e, "client disconnected (chat send)");
                client.alive = false;
            }
        }
    }

    /// Removes every connection scheduled for removal. Sockets close on
    /// drop; entities stay resident.
    fn reap(&mut self) {
        let dead: Vec<PlayerId> = self
            .clients
            .iter()
            .filter(|(_, c)| !c.alive)
            .map(|(&id, _)| id)
            .collect();

        for player_id in dead {
            if let Some(client) = self.clients.remove(&player_id) {
                info!(player_id = player_id.0, peer = %client.peer, "connection removed");
            }
        }
    }

    /// Serializes one snapshot of all active players and sends the identical
    /// bytes to every active connection.
    fn broadcast_state(&mut self) -> anyhow::Result<()> {
        let mut players = Vec::with_capacity(self.clients.len());
        for (&player_id, client) in self.clients.iter() {
            if !client.alive {
                continue;
            }
            if let Some(pos) = self.world.get::<Position>(client.entity) {
                players.push(PlayerState {
                    id: player_id,
                    x: pos.x,
                    y: pos.y,
                });
            }
        }

        let bytes = encode_line(&NetMsg::State { players }).context("serialize state")?;

        for (&player_id, client) in self.clients.iter_mut() {
            if !client.alive {
                continue;
            }
            if let Err(e) = client.conn.send_bytes(&bytes) {
                info!(player_id = player_id.0, error = %e, "client disconnected (state send)");
                client.alive = false;
            }
        }
        Ok(())
    }
}

/// Helper for tests: bind to an ephemeral port.
pub async fn bind_ephemeral(
    tick_hz: u32,
    world: Option<WorldConfig>,
) -> anyhow::Result<(GameServer, ServerConfig)> {
    let cfg = ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        tick_hz,
        world,
    };
    let server = GameServer::bind(cfg.clone()).await?;
    let cfg = ServerConfig {
        listen_addr: server.local_addr()?.to_string(),
        ..cfg
    };
    Ok((server, cfg))
}
