//! `arena_server`
//!
//! Server-side systems:
//! - Fixed timestep tick loop (accept, drain, reap, simulate, broadcast, pace)
//! - Connection registry with per-connection inbound framing
//! - Authoritative world mutation from `input` messages
//! - Snapshot broadcast and chat relay
//!
//! Networking model: one newline-framed TCP stream per client, polled
//! non-blocking once per tick.

pub mod server;

pub use server::GameServer;
