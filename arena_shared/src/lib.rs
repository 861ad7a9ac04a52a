//! `arena_shared`
//!
//! Shared libraries used by both client and server.
//!
//! Design goals:
//! - Deterministic simulation: fixed-step systems over a plain-data world.
//! - Clear separation of concerns (ecs, systems, net, config).
//! - The wire protocol and the component store are the only coupling
//!   between the two binaries.
//! - No `unsafe`.

pub mod config;
pub mod ecs;
pub mod net;
pub mod player;
pub mod systems;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::ecs::*;
    pub use crate::net::*;
    pub use crate::player::*;
    pub use crate::systems::*;
}
