use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use warden_core::ValidatorConfig;

pub async fn run(port: u16, data_dir: &Path, config: ValidatorConfig) -> anyhow::Result<()> {
    info!("Warden daemon starting");

    let store = crate::open_store(data_dir)?;
    let router = warden_api::build_router(store, Arc::new(config));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("Warden daemon stopped");
    Ok(())
}
