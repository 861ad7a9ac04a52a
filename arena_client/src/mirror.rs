//! Local mirror of the server world.
//!
//! The server's `state` snapshot is the whole truth: the mirror reconciles
//! its entity set to exactly the received `players` list, spawning entities
//! for newly seen ids and despawning ids no longer present. No prediction,
//! no interpolation.

use std::collections::HashMap;

use arena_shared::{
    ecs::{EntityId, Player, PlayerId, Position, World},
    net::PlayerState,
    player::{palette_color, spawn_player},
};

/// Render-side copy of the server world, keyed by player id.
#[derive(Default)]
pub struct MirrorWorld {
    world: World,
    entities: HashMap<PlayerId, EntityId>,
}

impl MirrorWorld {
    /// Reconciles the mirror against one snapshot.
    pub fn apply(&mut self, players: &[PlayerState]) {
        for p in players {
            let entity = match self.entities.get(&p.id) {
                Some(&entity) => entity,
                None => {
                    let entity =
                        spawn_player(&mut self.world, p.x, p.y, p.id, palette_color(p.id));
                    self.entities.insert(p.id, entity);
                    entity
                }
            };
            if let Some(pos) = self.world.get_mut::<Position>(entity) {
                pos.x = p.x;
                pos.y = p.y;
            }
        }

        let gone: Vec<PlayerId> = self
            .entities
            .keys()
            .copied()
            .filter(|id| !players.iter().any(|p| p.id == *id))
            .collect();
        for id in gone {
            if let Some(entity) = self.entities.remove(&id) {
                self.world.despawn(entity);
            }
        }
    }

    /// Last broadcast position of a player.
    pub fn position_of(&self, id: PlayerId) -> Option<(f32, f32)> {
        let entity = *self.entities.get(&id)?;
        self.world.get::<Position>(entity).map(|p| (p.x, p.y))
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.world.iter::<Player>().map(|(_, p)| p.id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The underlying world, for whatever draws it.
    pub fn world(&self) -> &World {
        &self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: u32, x: f32, y: f32) -> PlayerState {
        PlayerState {
            id: PlayerId(id),
            x,
            y,
        }
    }

    #[test]
    fn apply_creates_updates_and_destroys() {
        let mut mirror = MirrorWorld::default();

        mirror.apply(&[state(1, 10.0, 20.0), state(2, 30.0, 40.0)]);
        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror.position_of(PlayerId(1)), Some((10.0, 20.0)));

        // Player 2 disappears, player 1 moves.
        mirror.apply(&[state(1, 15.0, 20.0)]);
        assert_eq!(mirror.len(), 1);
        assert_eq!(mirror.position_of(PlayerId(1)), Some((15.0, 20.0)));
        assert_eq!(mirror.position_of(PlayerId(2)), None);
    }

    #[test]
    fn mirror_entity_survives_across_snapshots() {
        let mut mirror = MirrorWorld::default();
        mirror.apply(&[state(1, 0.0, 0.0)]);
        let before: Vec<_> = mirror.player_ids().collect();
        mirror.apply(&[state(1, 5.0, 5.0)]);
        let after: Vec<_> = mirror.player_ids().collect();
        assert_eq!(before, after);
    }
}
