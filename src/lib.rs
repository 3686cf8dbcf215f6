//! # Modulus
//!
//! Application composition for async Rust services.
//!
//! An application is an ordered list of modules. Each module opts into the
//! lifecycle phases it cares about (Init, ProvidedServices, Start, Stop) and
//! contributes constructors to a type-keyed dependency registry that any
//! module or request handler can resolve from.
//!
//! ## Features
//!
//! - **Capability-based modules**: implement only the phases a module needs
//! - **Dependency registry**: one constructor per type, resolved on demand with
//!   recursive parameters
//! - **Concurrent Start/Stop**: every failure reported, cancellation through a root token
//! - **Configuration and logging**: dotenv-backed [`EnvConfig`] and a
//!   `tracing`-backed [`Logger`] by default
//! - **Axum integration**: [`Inject`] extractor and a [`Routes`](routes::Routes) table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modulus::prelude::*;
//!
//! #[derive(Clone)]
//! pub struct Greeter {
//!     greeting: String,
//! }
//!
//! struct GreeterModule;
//!
//! impl Module for GreeterModule {
//!     fn as_service_provider(self: Arc<Self>) -> Option<Arc<dyn ServiceProvider>> {
//!         Some(self)
//!     }
//!
//!     fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
//!         Some(self)
//!     }
//! }
//!
//! impl ServiceProvider for GreeterModule {
//!     fn provided_services(&self) -> Vec<Provider> {
//!         vec![Provider::new(|resolver: &Resolver<'_>| {
//!             let config = resolver.resolve::<Arc<dyn Config>>()?;
//!             let greeting = config.get_string("GREETING").unwrap_or_else(|_| "hello".into());
//!             Ok(Greeter { greeting })
//!         })]
//!     }
//! }
//!
//! #[async_trait]
//! impl Starter for GreeterModule {
//!     async fn start(&self, app: &Application) -> anyhow::Result<()> {
//!         let greeter = app.resolve::<Greeter>()?;
//!         app.logger().info(format_args!("{}", greeter.greeting));
//!         app.cancellation_token().cancelled().await;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     modulus::logger::init_tracing("info");
//!
//!     let cancel = CancellationToken::new();
//!     let app = Application::new(cancel, vec![Arc::new(GreeterModule)]).await?;
//!
//!     // Returns once Ctrl+C/SIGTERM has been handled and every Stopper has run.
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

// Lets `#[derive(Injectable)]` expand to `::modulus::...` inside this crate too.
extern crate self as modulus;

pub mod config;
pub mod di;
pub mod error;
pub mod lifecycle;
pub mod logger;
pub mod module;
pub mod routes;

// Re-export core types
pub use config::{Config, EnvConfig};
pub use di::{Container, HasContainer, Inject, Injectable, Provider, Resolver};
pub use error::{ModulusError, Result};
pub use lifecycle::{Application, ApplicationBuilder, LifecycleError, Phase};
pub use logger::{LogLevel, Logger, TracingLogger};
pub use module::{Initializer, Module, ServiceProvider, Starter, Stopper};

// Re-export macros
pub use modulus_macro::Injectable as DeriveInjectable;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
///
/// ```
/// use modulus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, EnvConfig};
    pub use crate::di::{Container, HasContainer, Inject, Injectable, Provider, Resolver};
    pub use crate::error::{ModulusError, Result};
    pub use crate::lifecycle::{
        AggregateError, Application, ApplicationBuilder, LifecycleError, Phase, ShutdownHandler,
        shutdown_signal,
    };
    pub use crate::logger::{LogLevel, Logger, TracingLogger};
    pub use crate::module::{Initializer, Module, ServiceProvider, Starter, Stopper};
    pub use crate::routes::Routes;
    pub use crate::DeriveInjectable as Injectable;
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
    pub use tokio_util::sync::CancellationToken;
}
