//! Signal handling
//!
//! Bootstrap can take a while (connecting to databases, warming caches). An
//! interrupt during that time should abort it cooperatively instead of
//! leaving half-configured services running.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Completes when SIGINT (Ctrl+C) or, on unix, SIGTERM is received.
///
/// If a handler cannot be installed the error is logged and that signal is
/// never reported.
///
/// # Example
///
/// ```rust,ignore
/// axum::serve(listener, router)
///     .with_graceful_shutdown(bootkit::lifecycle::shutdown_signal())
///     .await?;
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}

/// Cancel `token` when a shutdown signal arrives.
///
/// The task ends early if the token is cancelled by someone else. Abort the
/// returned handle once bootstrap has finished to stop listening.
///
/// # Example
///
/// ```rust,ignore
/// let kernel = HostKernel::new::<AppModule>()?;
/// let watcher = cancel_on_shutdown(kernel.cancellation_token());
/// let router = kernel.bootstrap().await?;
/// watcher.abort();
/// ```
pub fn cancel_on_shutdown(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                tracing::warn!("Shutdown requested during bootstrap, cancelling");
                token.cancel();
            },
            _ = token.cancelled() => {},
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watcher_exits_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let watcher = cancel_on_shutdown(token.clone());
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), watcher)
            .await
            .unwrap()
            .unwrap();
    }
}
