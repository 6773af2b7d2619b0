use tokio::signal;

pub async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {e}");
        return;
    }

    #[cfg(not(windows))]
    println!();
    tracing::info!("Ctrl+C received, draining open connections.");
}
