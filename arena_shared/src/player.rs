//! Player entity factory.

use crate::ecs::{EntityId, Health, Input, Player, PlayerId, Position, Renderable, Velocity, World};

/// Side length of the square player footprint, in world units.
pub const PLAYER_FOOTPRINT: f32 = 32.0;

/// Starting and maximum health for a fresh player.
pub const PLAYER_HEALTH: i32 = 100;

const PALETTE: [[u8; 3]; 6] = [
    [0, 200, 0],
    [200, 0, 0],
    [0, 120, 220],
    [220, 180, 0],
    [160, 0, 200],
    [0, 200, 180],
];

/// Deterministic color for a player id. Ids start at 1; the palette wraps.
pub fn palette_color(id: PlayerId) -> [u8; 3] {
    PALETTE[id.0.saturating_sub(1) as usize % PALETTE.len()]
}

/// Spawns a player entity with the full component bundle attached.
pub fn spawn_player(
    world: &mut World,
    x: f32,
    y: f32,
    player_id: PlayerId,
    color: [u8; 3],
) -> EntityId {
    let entity = world.spawn();
    world.insert(entity, Position { x, y });
    world.insert(entity, Velocity::default());
    world.insert(
        entity,
        Renderable {
            width: PLAYER_FOOTPRINT,
            height: PLAYER_FOOTPRINT,
            color,
        },
    );
    world.insert(entity, Input::default());
    world.insert(entity, Player { id: player_id });
    world.insert(
        entity,
        Health {
            current: PLAYER_HEALTH,
            maximum: PLAYER_HEALTH,
        },
    );
    entity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_bundle_is_complete() {
        let mut world = World::default();
        let e = spawn_player(&mut world, 10.0, 20.0, PlayerId(3), [200, 0, 0]);

        assert_eq!(world.get::<Position>(e).unwrap().x, 10.0);
        assert_eq!(world.get::<Velocity>(e).unwrap(), &Velocity::default());
        assert_eq!(world.get::<Input>(e).unwrap(), &Input::default());
        assert_eq!(world.get::<Renderable>(e).unwrap().width, PLAYER_FOOTPRINT);
        assert_eq!(world.get::<Player>(e).unwrap().id, PlayerId(3));
        assert_eq!(world.get::<Health>(e).unwrap().current, PLAYER_HEALTH);
    }

    #[test]
    fn palette_is_deterministic_and_wraps() {
        assert_eq!(palette_color(PlayerId(1)), palette_color(PlayerId(7)));
        assert_ne!(palette_color(PlayerId(1)), palette_color(PlayerId(2)));
    }
}
