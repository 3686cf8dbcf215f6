//! Application Lifecycle
//!
//! Drives the modules of an [`Application`] through four phases.
//!
//! # Lifecycle Phases
//!
//! ```text
//! Application::new(cancel, modules)
//!    ↓
//! 1. Config / Logger selection          (first module exposing one, else defaults)
//!    ↓
//! 2. Init              sequential       ← Initializer, first failure aborts
//!    ↓
//! 3. ProvidedServices  sequential       ← ServiceProvider, registry sealed after
//!    ↓
//! Application::start()
//!    ↓
//! 4. Start             concurrent       ← Starter, every failure aggregated
//!    ↓
//! [Running... until the root token is cancelled]
//!    ↓
//! Application::stop()
//!    ↓
//! 5. Stop              concurrent       ← Stopper, every failure aggregated
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use modulus::prelude::*;
//!
//! struct Database { /* pool */ }
//!
//! impl Module for Database {
//!     fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn Initializer>> {
//!         Some(self)
//!     }
//!
//!     fn as_stopper(self: Arc<Self>) -> Option<Arc<dyn Stopper>> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl Initializer for Database {
//!     async fn init(&self, app: &Application) -> anyhow::Result<()> {
//!         let url = app.config().get_string("DATABASE_URL")?;
//!         app.logger().info(format_args!("Connecting to {url}"));
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Stopper for Database {
//!     async fn stop(&self, _app: &Application) -> anyhow::Result<()> {
//!         tracing::info!("Closing database connections");
//!         Ok(())
//!     }
//! }
//! ```

mod application;
mod error;
mod phase;
mod shutdown;

pub use application::{Application, ApplicationBuilder, DEFAULT_SHUTDOWN_GRACE};
pub use error::{AggregateError, LifecycleError, ModuleFailure, Result};
pub use phase::Phase;
pub use shutdown::{ShutdownHandler, shutdown_signal};
