//! Entity/component system (minimal ECS).
//!
//! This is a deliberately small ECS suitable for deterministic simulation and
//! net replication. It is not archetype-based; each known component kind gets
//! its own sparse map keyed by entity id, and the `Component` trait selects
//! the right map at compile time. There is no runtime type dispatch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opaque entity id. Monotonically increasing, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Stable application-level player identity, distinct from the entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// World-space position. Mutated only by simulation systems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Velocity, derived each tick from [`Input`]; never set directly by the net.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

/// Movement intent, nominally in `[-1, 1]` per axis. Overwritten wholesale on
/// each decoded `input` message; absent messages leave it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Input {
    pub move_x: f32,
    pub move_y: f32,
}

/// Immutable footprint/visual descriptor, set at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub width: f32,
    pub height: f32,
    pub color: [u8; 3],
}

/// Ties an entity to its owning player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
}

/// Part of the player bundle; not consumed by any system yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub maximum: i32,
}

/// World bounds resource. Absent means "no clamping".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub tile_size: f32,
}

/// Sparse component storage keyed by entity id.
#[derive(Debug)]
pub struct ComponentMap<T> {
    entries: HashMap<EntityId, T>,
}

impl<T> Default for ComponentMap<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ComponentMap<T> {
    fn insert(&mut self, entity: EntityId, component: T) {
        self.entries.insert(entity, component);
    }

    fn get(&self, entity: EntityId) -> Option<&T> {
        self.entries.get(&entity)
    }

    fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entries.get_mut(&entity)
    }

    fn remove(&mut self, entity: EntityId) {
        self.entries.remove(&entity);
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

/// Maps a component type to its storage field inside the world.
pub trait Component: Sized + 'static {
    fn storage(world: &World) -> &ComponentMap<Self>;
    fn storage_mut(world: &mut World) -> &mut ComponentMap<Self>;
}

/// Maps a resource type to its singleton slot inside the world.
pub trait Resource: Sized + 'static {
    fn slot(world: &World) -> &Option<Self>;
    fn slot_mut(world: &mut World) -> &mut Option<Self>;
}

/// The component store: one sparse map per component kind, plus singleton
/// resource slots. Pure data; systems provide the behavior.
#[derive(Debug, Default)]
pub struct World {
    next_id: u64,
    positions: ComponentMap<Position>,
    velocities: ComponentMap<Velocity>,
    inputs: ComponentMap<Input>,
    renderables: ComponentMap<Renderable>,
    players: ComponentMap<Player>,
    healths: ComponentMap<Health>,
    world_config: Option<WorldConfig>,
}

macro_rules! impl_component {
    ($ty:ty, $field:ident) => {
        impl Component for $ty {
            fn storage(world: &World) -> &ComponentMap<Self> {
                &world.$field
            }
            fn storage_mut(world: &mut World) -> &mut ComponentMap<Self> {
                &mut world.$field
            }
        }
    };
}

impl_component!(Position, positions);
impl_component!(Velocity, velocities);
impl_component!(Input, inputs);
impl_component!(Renderable, renderables);
impl_component!(Player, players);
impl_component!(Health, healths);

impl Resource for WorldConfig {
    fn slot(world: &World) -> &Option<Self> {
        &world.world_config
    }
    fn slot_mut(world: &mut World) -> &mut Option<Self> {
        &mut world.world_config
    }
}

impl World {
    /// Creates a new entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserts/replaces a component for an entity.
    pub fn insert<T: Component>(&mut self, entity: EntityId, component: T) {
        T::storage_mut(self).insert(entity, component);
    }

    /// Gets a component reference. Absence is `None`, not an error.
    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        T::storage(self).get(entity)
    }

    /// Gets a mutable component reference.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        T::storage_mut(self).get_mut(entity)
    }

    /// Iterates entities with a given component. Order is unspecified.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        T::storage(self).iter()
    }

    /// Entities holding both `A` and `B`, collected eagerly so the result is
    /// a consistent snapshot of the intersection taken at call time.
    pub fn entities_with2<A: Component, B: Component>(&self) -> Vec<EntityId> {
        A::storage(self)
            .iter()
            .map(|(e, _)| e)
            .filter(|&e| B::storage(self).contains(e))
            .collect()
    }

    /// Entities holding `A`, `B`, and `C`.
    pub fn entities_with3<A: Component, B: Component, C: Component>(&self) -> Vec<EntityId> {
        A::storage(self)
            .iter()
            .map(|(e, _)| e)
            .filter(|&e| B::storage(self).contains(e) && C::storage(self).contains(e))
            .collect()
    }

    /// Entities holding `A`, `B`, `C`, and `D`.
    pub fn entities_with4<A: Component, B: Component, C: Component, D: Component>(
        &self,
    ) -> Vec<EntityId> {
        A::storage(self)
            .iter()
            .map(|(e, _)| e)
            .filter(|&e| {
                B::storage(self).contains(e)
                    && C::storage(self).contains(e)
                    && D::storage(self).contains(e)
            })
            .collect()
    }

    /// Removes the entity's row from every component table. Idempotent.
    pub fn despawn(&mut self, entity: EntityId) {
        self.positions.remove(entity);
        self.velocities.remove(entity);
        self.inputs.remove(entity);
        self.renderables.remove(entity);
        self.players.remove(entity);
        self.healths.remove(entity);
    }

    /// Sets a singleton resource, replacing any previous value.
    pub fn set_resource<R: Resource>(&mut self, value: R) {
        *R::slot_mut(self) = Some(value);
    }

    /// Gets a singleton resource.
    pub fn resource<R: Resource>(&self) -> Option<&R> {
        R::slot(self).as_ref()
    }
}
