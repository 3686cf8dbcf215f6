//! Module contracts
//!
//! A module is any value handed to [`Application::new`](crate::Application::new).
//! It takes part in a lifecycle phase only if it exposes the matching
//! capability through one of the `as_*` accessors; the defaults return `None`,
//! so a module implements exactly the subset it needs.
//!
//! # Example
//!
//! ```rust,ignore
//! use modulus::prelude::*;
//!
//! struct HttpServer { /* ... */ }
//!
//! impl Module for HttpServer {
//!     fn as_service_provider(self: Arc<Self>) -> Option<Arc<dyn ServiceProvider>> {
//!         Some(self)
//!     }
//!
//!     fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
//!         Some(self)
//!     }
//! }
//! ```

use crate::config::Config;
use crate::di::Provider;
use crate::lifecycle::Application;
use crate::logger::Logger;
use async_trait::async_trait;
use std::sync::Arc;

/// A unit of functionality composed into an [`Application`].
pub trait Module: Send + Sync + 'static {
    /// Name used in logs and error reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn as_initializer(self: Arc<Self>) -> Option<Arc<dyn Initializer>> {
        None
    }

    fn as_service_provider(self: Arc<Self>) -> Option<Arc<dyn ServiceProvider>> {
        None
    }

    fn as_starter(self: Arc<Self>) -> Option<Arc<dyn Starter>> {
        None
    }

    fn as_stopper(self: Arc<Self>) -> Option<Arc<dyn Stopper>> {
        None
    }

    /// The first module in list order returning `Some` becomes the application configuration.
    fn as_config(self: Arc<Self>) -> Option<Arc<dyn Config>> {
        None
    }

    /// The first module in list order returning `Some` becomes the application logger.
    fn as_logger(self: Arc<Self>) -> Option<Arc<dyn Logger>> {
        None
    }
}

/// Called once per module while the application is being constructed
///
/// Init runs sequentially in module order, before any services are
/// registered. Only the configuration and the logger can be resolved here.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn init(&self, app: &Application) -> anyhow::Result<()>;
}

/// Declares the constructors a module contributes to the registry
pub trait ServiceProvider: Send + Sync {
    /// Every returned provider is registered; a type may only be provided once
    /// across the whole application.
    fn provided_services(&self) -> Vec<Provider>;
}

/// Starts a module's long-running work, for example a network listener
///
/// All starters run concurrently. Implementations that block should watch
/// [`Application::cancellation_token`] and return when it fires.
#[async_trait]
pub trait Starter: Send + Sync {
    async fn start(&self, app: &Application) -> anyhow::Result<()>;
}

/// Releases a module's resources, for example a database connection
#[async_trait]
pub trait Stopper: Send + Sync {
    async fn stop(&self, app: &Application) -> anyhow::Result<()>;
}

/// Snapshot of the capabilities a module exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub has_init: bool,
    pub has_services: bool,
    pub has_start: bool,
    pub has_stop: bool,
    pub is_config: bool,
    pub is_logger: bool,
}

impl Capabilities {
    pub fn of(module: &Arc<dyn Module>) -> Self {
        Self {
            has_init: Arc::clone(module).as_initializer().is_some(),
            has_services: Arc::clone(module).as_service_provider().is_some(),
            has_start: Arc::clone(module).as_starter().is_some(),
            has_stop: Arc::clone(module).as_stopper().is_some(),
            is_config: Arc::clone(module).as_config().is_some(),
            is_logger: Arc::clone(module).as_logger().is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
