//! # OS signal handling for the binary.
//!
//! [`wait_for_shutdown_signal`] completes on SIGINT / SIGTERM / SIGQUIT (Unix)
//! or Ctrl-C (elsewhere). [`signal_or_pending`] is the form the system awaits:
//! if listeners cannot be installed it logs and never completes, so the system
//! keeps running instead of shutting down immediately.

/// Waits for a termination signal.
///
/// Returns `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Completes on a termination signal; pends forever if none can be observed.
pub async fn signal_or_pending() {
    if let Err(e) = wait_for_shutdown_signal().await {
        tracing::warn!(error = %e, "signal listeners unavailable; running until killed");
        std::future::pending::<()>().await;
    }
}
