//! Graceful Shutdown Handler
//!
//! Handles OS signals and performs graceful shutdown of the application.

use super::{Application, Result};
use tokio::signal;

/// Handles graceful shutdown of the application
///
/// Waits for SIGTERM/SIGINT or for the root cancellation token, cancels the
/// token so every starter unwinds, then runs the Stop phase.
///
/// # Example
///
/// ```rust,ignore
/// let app = Application::new(cancel, modules).await?;
/// let shutdown = app.spawn_shutdown_handler();
///
/// match app.start().await {
///     Ok(()) | Err(LifecycleError::Cancelled { .. }) => {}
///     Err(e) => tracing::error!("Start failed: {e}"),
/// }
///
/// // Make sure Stop runs even when Start returned on its own.
/// app.cancellation_token().cancel();
/// shutdown.await??;
/// ```
///
/// [`Application::run`] does exactly this.
pub struct ShutdownHandler {
    app: Application,
}

impl ShutdownHandler {
    /// Create a new ShutdownHandler
    pub fn new(app: Application) -> Self {
        Self { app }
    }

    /// Wait for a shutdown trigger and perform graceful shutdown
    pub async fn wait_for_shutdown(&self) -> Result<()> {
        let cancel = self.app.cancellation_token();
        tokio::select! {
            _ = shutdown_signal() => {},
            _ = cancel.cancelled() => {
                tracing::info!("Root context cancelled");
            },
        }

        self.shutdown().await
    }

    /// Perform graceful shutdown
    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Starting graceful shutdown...");
        self.app.cancellation_token().cancel();

        if !self.app.is_started() {
            tracing::info!("Application was never started, nothing to stop");
            return Ok(());
        }

        if let Err(e) = self.app.stop().await {
            tracing::error!("Error during application stop: {}", e);
            return Err(e);
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}

/// Create a future that completes when a shutdown signal is received
///
/// This is a standalone function that can be used without a ShutdownHandler.
///
/// # Example
///
/// ```rust,ignore
/// use modulus::lifecycle::shutdown_signal;
///
/// tokio::select! {
///     _ = shutdown_signal() => {
///         println!("Shutdown signal received");
///     }
///     _ = server.serve() => {}
/// }
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
