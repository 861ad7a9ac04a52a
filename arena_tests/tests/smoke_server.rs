use arena_server::server::bind_ephemeral;

/// Smoke test: server can run a few ticks without panicking.
#[tokio::test]
async fn server_runs_few_ticks() -> anyhow::Result<()> {
    let (mut server, _cfg) = bind_ephemeral(60, None).await?;
    server.run_for_ticks(3).await?;
    assert_eq!(server.tick(), 3);
    Ok(())
}
