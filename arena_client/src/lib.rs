//! `arena_client`
//!
//! Client-side systems:
//! - Connection management over one newline-framed TCP stream
//! - Per-tick input command sending
//! - Mirror world reconciliation from state snapshots
//! - Bounded chat history
//!
//! Rendering and keyboard capture live outside this crate; the mirror world
//! is whatever a front end would draw.

pub mod chat;
pub mod client;
pub mod mirror;

pub use client::GameClient;
