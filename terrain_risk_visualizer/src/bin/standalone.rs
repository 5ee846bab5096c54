use terrain_risk_visualizer::{ServerConfig, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Bind address, upload directory and limits from env or defaults
    let cfg = ServerConfig::from_env();

    let handle = start_server(cfg).await?;
    // Park forever
    handle.await.ok();
    Ok(())
}
