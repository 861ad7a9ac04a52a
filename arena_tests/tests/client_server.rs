//! Full socket-based integration tests for client ↔ server communication.

use std::time::Duration;

use arena_client::GameClient;
use arena_server::server::bind_ephemeral;
use arena_server::GameServer;
use arena_shared::config::ServerConfig;
use arena_shared::ecs::{PlayerId, Position, WorldConfig};

const DT: f32 = 1.0 / 60.0;

fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

fn small_world() -> Option<WorldConfig> {
    Some(WorldConfig {
        width: 500.0,
        height: 500.0,
        tile_size: 32.0,
    })
}

/// Connects a client while stepping the server so the accept and welcome can
/// happen; the server accepts at most one connection per tick.
async fn connect_while_stepping(
    server: &mut GameServer,
    cfg: &ServerConfig,
) -> anyhow::Result<GameClient> {
    let cfg = cfg.clone();
    let handle = tokio::spawn(async move { GameClient::connect(&cfg).await });
    for _ in 0..50 {
        server.step(DT).await?;
        if handle.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handle.await?
}

async fn step_n(server: &mut GameServer, ticks: u32) -> anyhow::Result<()> {
    for _ in 0..ticks {
        server.step(DT).await?;
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn welcome_ids_are_sequential_and_carry_bounds() -> anyhow::Result<()> {
    init_logs();
    let (mut server, cfg) = bind_ephemeral(60, small_world()).await?;

    let c1 = connect_while_stepping(&mut server, &cfg).await?;
    let c2 = connect_while_stepping(&mut server, &cfg).await?;

    assert_eq!(c1.player_id, PlayerId(1));
    assert_eq!(c2.player_id, PlayerId(2));
    assert_eq!(c1.world_bounds, Some((500.0, 500.0)));
    assert_eq!(server.client_count(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn input_moves_player_until_clamped_at_the_wall() -> anyhow::Result<()> {
    init_logs();
    let (mut server, cfg) = bind_ephemeral(60, small_world()).await?;
    let mut c1 = connect_while_stepping(&mut server, &cfg).await?;

    // Start right next to the wall.
    let entity = server.entity_of(PlayerId(1)).expect("player 1 entity");
    server
        .world_mut()
        .get_mut::<Position>(entity)
        .expect("position")
        .x = 490.0;

    // One input message; last-known-intent keeps applying it every tick.
    c1.send_input(1.0, 0.0)?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Half a second of ticks pushing right.
    step_n(&mut server, 30).await?;

    let pos = server.world().get::<Position>(entity).expect("position");
    assert_eq!(pos.x, 500.0 - 32.0);
    assert_eq!(pos.y, 300.0);

    // The client's mirror converges on the clamped position.
    tokio::time::sleep(Duration::from_millis(20)).await;
    c1.poll();
    assert_eq!(c1.position_of(PlayerId(1)), Some((468.0, 300.0)));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_reaches_everyone_but_the_sender() -> anyhow::Result<()> {
    init_logs();
    let (mut server, cfg) = bind_ephemeral(60, None).await?;
    let mut c1 = connect_while_stepping(&mut server, &cfg).await?;
    let mut c2 = connect_while_stepping(&mut server, &cfg).await?;

    c1.send_chat("hi")?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    step_n(&mut server, 3).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    c2.poll();
    let line = c2.chat.last().expect("relayed chat");
    assert_eq!(line.from, PlayerId(1));
    assert_eq!(line.text, "hi");

    // The sender never sees its own message echoed back.
    c1.poll();
    assert!(c1.chat.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnected_peer_vanishes_from_the_next_snapshot() -> anyhow::Result<()> {
    init_logs();
    let (mut server, cfg) = bind_ephemeral(60, None).await?;
    let mut c1 = connect_while_stepping(&mut server, &cfg).await?;
    let c2 = connect_while_stepping(&mut server, &cfg).await?;

    // Both players visible first.
    step_n(&mut server, 2).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    c1.poll();
    assert_eq!(c1.mirror().len(), 2);

    // Peer closes; the server reaps it and the snapshot omits it.
    drop(c2);
    tokio::time::sleep(Duration::from_millis(20)).await;
    step_n(&mut server, 3).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    c1.poll();
    let ids: Vec<PlayerId> = c1.mirror().player_ids().collect();
    assert_eq!(ids, vec![PlayerId(1)]);
    assert_eq!(server.client_count(), 1);
    Ok(())
}
