use eyre::{Result, WrapErr};
use tokio::signal;

/// Why the process was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
}

/// Wait until the process receives SIGINT or SIGTERM.
pub async fn wait_for_signal() -> Result<ShutdownReason> {
    tracing::info!("Signal handler started. Listening for SIGTERM and SIGINT");

    tokio::select! {
        result = signal::ctrl_c() => {
            result.wrap_err("Failed to listen for Ctrl+C")?;
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            Ok(ShutdownReason::Interrupt)
        }
        result = wait_for_sigterm() => {
            result?;
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            Ok(ShutdownReason::Terminate)
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm =
        signal(SignalKind::terminate()).wrap_err("Failed to register SIGTERM handler")?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix systems, we only have Ctrl+C
    std::future::pending::<()>().await;
    Ok(())
}
