//! Standalone server binary.
//!
//! Usage:
//!   cargo run -p arena_server -- [--addr 127.0.0.1:5000] [--tick-hz 60]
//!
//! The server accepts client connections, runs the fixed timestep tick loop,
//! and broadcasts state snapshots to every connected client.
//!
//! Console commands (stdin): quit | exit | stop | shutdown

use std::env;
use std::io::BufRead;
use std::sync::atomic::Ordering;

use anyhow::Context;
use arena_server::GameServer;
use arena_shared::config::ServerConfig;
use tracing::info;

fn parse_args() -> ServerConfig {
    let mut cfg = ServerConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.listen_addr = args[i + 1].clone();
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                cfg.tick_hz = args[i + 1].parse().unwrap_or(60);
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(addr = %cfg.listen_addr, tick_hz = cfg.tick_hz, "starting server");

    let mut server = GameServer::bind(cfg).await.context("bind server")?;
    let local = server.local_addr()?;
    info!(%local, "server listening");

    // Stdin listener: the shutdown flag is the only cross-thread state.
    let shutdown = server.shutdown_flag();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim().to_lowercase().as_str() {
                "quit" | "exit" | "stop" | "shutdown" => {
                    info!("shutdown command received");
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
                _ => {}
            }
        }
    });

    server.run().await?;
    Ok(())
}
