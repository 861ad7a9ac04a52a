//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p arena_client -- [--addr 127.0.0.1:5000] [--tick-hz 60]
//!
//! Connects to the server, sends one input message per tick (zero intent —
//! a real front end would sample the keyboard here), and logs snapshots.
//!
//! Console commands (stdin):
//!   say <message> - Send chat
//!   status        - Show session info
//!   quit          - Exit

use std::env;
use std::io::BufRead;
use std::time::Duration;

use anyhow::Context;
use arena_client::client::{GameClient, SessionState};
use arena_shared::config::ServerConfig;
use tokio::sync::mpsc;
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
    info!(server = %cfg.listen_addr, "starting client");

    let mut client = GameClient::connect(&cfg).await.context("connect")?;

    // Stdin reader thread feeding the console channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Connected as player {}. Type 'say <text>' to chat, 'quit' to exit.", client.player_id.0);

    let tick_interval = Duration::from_secs_f32(1.0 / cfg.tick_hz as f32);
    let mut seen_chat = 0;
    let mut ticks: u64 = 0;

    loop {
        while let Ok(line) = console_rx.try_recv() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.first().copied() {
                Some("say") => {
                    let text = tokens[1..].join(" ");
                    if let Err(e) = client.send_chat(text) {
                        println!("chat failed: {e}");
                    }
                }
                Some("status") => {
                    println!("player {} | {} players visible", client.player_id.0, client.mirror().len());
                }
                Some("quit") | Some("exit") => return Ok(()),
                _ => {}
            }
        }

        // No keyboard capture here; intent stays zero.
        if client.send_input(0.0, 0.0).is_err() {
            println!("Lost connection to server.");
            break;
        }

        client.poll();
        if client.state == SessionState::Disconnected {
            println!("Disconnected from server.");
            break;
        }

        for line in client.chat.iter().skip(seen_chat) {
            println!("[chat] player {}: {}", line.from.0, line.text);
        }
        seen_chat = client.chat.len();

        ticks += 1;
        if ticks % 60 == 0 {
            if let Some((x, y)) = client.position_of(client.player_id) {
                info!(players = client.mirror().len(), x, y, "snapshot");
            }
        }

        tokio::time::sleep(tick_interval).await;
    }

    Ok(())
}
