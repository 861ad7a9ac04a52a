//! Simulation systems.
//!
//! Systems run exactly once per tick with a constant `dt` derived from the
//! configured tick rate, never a wall-clock delta. That is what keeps the
//! simulation deterministic despite jittery I/O timing.

use crate::ecs::{Input, Position, Renderable, Velocity, World, WorldConfig};

/// Player movement speed in world units per second.
pub const MOVE_SPEED: f32 = 200.0;

/// Clamps one axis into `[0, extent - footprint]`, low bound first.
fn clamp_axis(value: f32, extent: f32, footprint: f32) -> f32 {
    value.max(0.0).min(extent - footprint)
}

/// Derives velocity from movement intent, integrates position (explicit
/// Euler), and clamps to world bounds when a [`WorldConfig`] is present.
pub fn movement_system(world: &mut World, dt: f32) {
    let bounds = world.resource::<WorldConfig>().copied();

    for entity in world.entities_with4::<Position, Velocity, Input, Renderable>() {
        let Some(intent) = world.get::<Input>(entity).copied() else {
            continue;
        };
        let Some(footprint) = world
            .get::<Renderable>(entity)
            .map(|r| (r.width, r.height))
        else {
            continue;
        };

        let Some(vel) = world.get_mut::<Velocity>(entity) else {
            continue;
        };
        vel.x = intent.move_x * MOVE_SPEED;
        vel.y = intent.move_y * MOVE_SPEED;
        let vel = *vel;

        let Some(pos) = world.get_mut::<Position>(entity) else {
            continue;
        };
        pos.x += vel.x * dt;
        pos.y += vel.y * dt;

        if let Some(cfg) = bounds {
            pos.x = clamp_axis(pos.x, cfg.width, footprint.0);
            pos.y = clamp_axis(pos.y, cfg.height, footprint.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::spawn_player;
    use crate::ecs::PlayerId;

    const DT: f32 = 1.0 / 60.0;

    fn world_with_player(x: f32, y: f32) -> (World, crate::ecs::EntityId) {
        let mut world = World::default();
        let e = spawn_player(&mut world, x, y, PlayerId(1), [0, 200, 0]);
        (world, e)
    }

    #[test]
    fn position_delta_is_intent_times_speed_times_dt() {
        let (mut world, e) = world_with_player(100.0, 100.0);
        world.get_mut::<Input>(e).unwrap().move_x = 1.0;
        world.get_mut::<Input>(e).unwrap().move_y = -0.5;

        movement_system(&mut world, DT);

        let pos = world.get::<Position>(e).unwrap();
        assert_eq!(pos.x, 100.0 + MOVE_SPEED * DT);
        assert_eq!(pos.y, 100.0 + -0.5 * MOVE_SPEED * DT);

        let vel = world.get::<Velocity>(e).unwrap();
        assert_eq!(vel.x, MOVE_SPEED);
        assert_eq!(vel.y, -0.5 * MOVE_SPEED);
    }

    #[test]
    fn intent_persists_between_ticks() {
        let (mut world, e) = world_with_player(0.0, 0.0);
        world.get_mut::<Input>(e).unwrap().move_x = 1.0;

        movement_system(&mut world, DT);
        movement_system(&mut world, DT);

        // No decay to zero: the same intent applies again.
        let pos = world.get::<Position>(e).unwrap();
        assert_eq!(pos.x, 2.0 * MOVE_SPEED * DT);
    }

    #[test]
    fn no_bounds_means_no_clamping() {
        let (mut world, e) = world_with_player(0.0, 0.0);
        world.get_mut::<Input>(e).unwrap().move_x = -1.0;

        movement_system(&mut world, DT);

        assert!(world.get::<Position>(e).unwrap().x < 0.0);
    }

    #[test]
    fn position_clamps_to_extent_minus_footprint_and_stays() {
        let (mut world, e) = world_with_player(490.0, 300.0);
        world.set_resource(WorldConfig {
            width: 500.0,
            height: 500.0,
            tile_size: 32.0,
        });
        world.get_mut::<Input>(e).unwrap().move_x = 1.0;

        // Half a second of ticks pushing right against the wall.
        for _ in 0..30 {
            movement_system(&mut world, DT);
            assert_eq!(world.get::<Position>(e).unwrap().x, 500.0 - 32.0);
        }
    }

    #[test]
    fn clamp_is_idempotent() {
        assert_eq!(clamp_axis(clamp_axis(700.0, 500.0, 32.0), 500.0, 32.0), 468.0);
        assert_eq!(clamp_axis(clamp_axis(-3.0, 500.0, 32.0), 500.0, 32.0), 0.0);
        assert_eq!(clamp_axis(clamp_axis(120.0, 500.0, 32.0), 500.0, 32.0), 120.0);
    }

    #[test]
    fn oversized_footprint_collapses_to_the_lower_bound() {
        // Low bound applies first, then the high bound, so a footprint wider
        // than the world lands on the numerically lower value.
        assert_eq!(clamp_axis(50.0, 100.0, 150.0), -50.0);
    }
}
