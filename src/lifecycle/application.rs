//! Application Bootstrap
//!
//! Composes modules into a running application: wires the configuration,
//! logger and provided services into the registry, then drives Start/Stop.

use super::phase::{self, Interruption, Phase};
use super::{LifecycleError, Result, ShutdownHandler};
use crate::config::{Config, EnvConfig};
use crate::di::{Container, DEFAULT_MAX_RESOLVE_DEPTH, HasContainer, Provider};
use crate::logger::{Logger, TracingLogger};
use crate::module::{Capabilities, Module, Starter, Stopper};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long cancelled starters get to return before Start stops waiting for them.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A composed application
///
/// Cloning is cheap and every clone refers to the same registry, modules and
/// cancellation token.
///
/// # Example
///
/// ```rust,ignore
/// use modulus::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let cancel = CancellationToken::new();
///     let app = Application::new(cancel.clone(), vec![
///         Arc::new(DatabaseModule::default()),
///         Arc::new(HttpModule::default()),
///     ])
///     .await?;
///
///     // Starts every module, then stops them on Ctrl+C/SIGTERM or `cancel.cancel()`.
///     app.run().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Application {
    container: Arc<Container>,
    modules: Arc<[Arc<dyn Module>]>,
    cancel: CancellationToken,
    stop_timeout: Option<Duration>,
    shutdown_grace: Duration,
    started: Arc<AtomicBool>,
}

impl Application {
    /// Compose `modules` (in load order) under the root `cancel` token.
    ///
    /// Runs Init and ProvidedServices before returning. Any error means the
    /// application is unusable and has been discarded.
    pub async fn new(cancel: CancellationToken, modules: Vec<Arc<dyn Module>>) -> Result<Self> {
        Self::builder()
            .cancellation(cancel)
            .modules(modules)
            .build()
            .await
    }

    /// Create a new application builder
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Get a reference to the container
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Resolve a value from the registry
    pub fn resolve<T: Send + 'static>(&self) -> crate::Result<T> {
        self.container.resolve::<T>()
    }

    /// Modules in load order, including the default config/logger when they were used
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// The root execution context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// The application configuration; never fails.
    pub fn config(&self) -> Arc<dyn Config> {
        self.container
            .resolve::<Arc<dyn Config>>()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Configuration not resolvable, using defaults");
                Arc::new(EnvConfig::from_default_sources())
            })
    }

    /// The application logger; never fails.
    pub fn logger(&self) -> Arc<dyn Logger> {
        self.container
            .resolve::<Arc<dyn Logger>>()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Logger not resolvable, using default");
                Arc::new(TracingLogger::new())
            })
    }

    /// Start every module exposing the Starter capability, concurrently.
    ///
    /// Waits for all of them and reports every failure. Once the root token is
    /// cancelled, starters get the shutdown grace period to return; if they all
    /// do, their outcome is reported as usual. Starters still running after
    /// that are left running and reported in `LifecycleError::Cancelled`.
    pub async fn start(&self) -> Result<()> {
        self.started.store(true, Ordering::Release);

        let starters: Vec<(String, Arc<dyn Starter>)> = self
            .modules
            .iter()
            .filter_map(|m| {
                Arc::clone(m)
                    .as_starter()
                    .map(|starter| (m.name().to_string(), starter))
            })
            .collect();

        let cancel = self.cancel.clone();
        let grace = self.shutdown_grace;
        phase::fan_out(
            self,
            Phase::Start,
            starters,
            |starter, app| async move { starter.start(&app).await },
            async move {
                cancel.cancelled().await;
                Interruption::Cancelled { grace }
            },
            LifecycleError::Start,
        )
        .await
    }

    /// Stop every module exposing the Stopper capability, concurrently.
    ///
    /// Uses the same module order as [`start`](Self::start). The root token is
    /// not consulted, so Stop still runs after a cancellation; use
    /// [`ApplicationBuilder::stop_timeout`] to bound it.
    pub async fn stop(&self) -> Result<()> {
        if !self.is_started() {
            return Err(LifecycleError::NotStarted);
        }

        let stoppers: Vec<(String, Arc<dyn Stopper>)> = self
            .modules
            .iter()
            .filter_map(|m| {
                Arc::clone(m)
                    .as_stopper()
                    .map(|stopper| (m.name().to_string(), stopper))
            })
            .collect();

        let stop_timeout = self.stop_timeout;
        phase::fan_out(
            self,
            Phase::Stop,
            stoppers,
            |stopper, app| async move { stopper.stop(&app).await },
            async move {
                match stop_timeout {
                    Some(after) => {
                        tokio::time::sleep(after).await;
                        Interruption::TimedOut(after)
                    }
                    None => std::future::pending().await,
                }
            },
            LifecycleError::Stop,
        )
        .await
    }

    /// Start the application and stop it again on shutdown.
    ///
    /// Runs Start alongside a [`ShutdownHandler`]. Once Start returns, for
    /// whatever reason, the root token is cancelled so the handler runs Stop,
    /// and this only returns after Stop has finished. A cancelled Start is a
    /// normal shutdown and is not reported as an error.
    pub async fn run(&self) -> Result<()> {
        let handler = self.shutdown_handler();
        let (started, stopped) = tokio::join!(
            async {
                let started = self.start().await;
                self.cancel.cancel();
                started
            },
            handler.wait_for_shutdown(),
        );

        match started {
            Ok(()) | Err(LifecycleError::Cancelled { .. }) => stopped,
            Err(err) => {
                if let Err(stop_err) = stopped {
                    tracing::error!(error = %stop_err, "Stop failed after a failed start");
                }
                Err(err)
            }
        }
    }

    /// Create a shutdown handler for graceful shutdown
    pub fn shutdown_handler(&self) -> ShutdownHandler {
        ShutdownHandler::new(self.clone())
    }

    /// Spawn a background task that waits for a shutdown signal (or the root
    /// token), cancels the root token and stops the application.
    ///
    /// Await the returned handle before leaving `main`, otherwise the runtime
    /// may shut down while Stop is still running.
    pub fn spawn_shutdown_handler(&self) -> tokio::task::JoinHandle<Result<()>> {
        let shutdown_handler = self.shutdown_handler();
        tokio::spawn(async move { shutdown_handler.wait_for_shutdown().await })
    }

    async fn run_init_phase(&self) -> Result<()> {
        tracing::info!("Phase: init");

        let mut initialized = 0;
        for module in self.modules.iter() {
            let Some(initializer) = Arc::clone(module).as_initializer() else {
                continue;
            };
            tracing::debug!(module = module.name(), "Initializing");
            initializer.init(self).await.map_err(|source| {
                tracing::error!(module = module.name(), error = %source, "Init failed");
                LifecycleError::Initialization {
                    module: module.name().to_string(),
                    source,
                }
            })?;
            initialized += 1;
        }

        tracing::info!("Init complete ({} modules initialized)", initialized);
        Ok(())
    }

    fn run_provided_services_phase(&self) -> Result<()> {
        tracing::info!("Phase: provided_services");

        for module in self.modules.iter() {
            let Some(provider) = Arc::clone(module).as_service_provider() else {
                continue;
            };
            for service in provider.provided_services() {
                let type_name = service.type_name();
                self.container.provide(service).map_err(|source| {
                    tracing::error!(
                        module = module.name(),
                        type_name,
                        error = %source,
                        "Registration failed"
                    );
                    LifecycleError::ProvideServices {
                        module: module.name().to_string(),
                        source,
                    }
                })?;
                tracing::debug!(module = module.name(), type_name, "Registered service");
            }
        }

        self.container.seal();
        tracing::info!(
            "Provided services complete ({} types registered)",
            self.container.len()
        );
        Ok(())
    }
}

impl HasContainer for Application {
    fn get_container(&self) -> &Container {
        &self.container
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let modules: Vec<&str> = self.modules.iter().map(|m| m.name()).collect();
        f.debug_struct("Application")
            .field("modules", &modules)
            .field("container", &self.container)
            .field("started", &self.is_started())
            .finish()
    }
}

/// Builder for Application
pub struct ApplicationBuilder {
    cancel: Option<CancellationToken>,
    modules: Vec<Arc<dyn Module>>,
    max_resolve_depth: usize,
    init_timeout: Option<Duration>,
    stop_timeout: Option<Duration>,
    shutdown_grace: Duration,
    default_config: bool,
    default_logger: bool,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            cancel: None,
            modules: Vec::new(),
            max_resolve_depth: DEFAULT_MAX_RESOLVE_DEPTH,
            init_timeout: None,
            stop_timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            default_config: false,
            default_logger: false,
        }
    }

    /// Set the root cancellation token (a fresh one is created otherwise)
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Append a module; load order is insertion order
    pub fn module(mut self, module: Arc<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Append several modules in order
    pub fn modules(mut self, modules: impl IntoIterator<Item = Arc<dyn Module>>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Bound on nested resolutions before failing with `CyclicDependency`
    pub fn max_resolve_depth(mut self, depth: usize) -> Self {
        self.max_resolve_depth = depth;
        self
    }

    /// Set a timeout for the whole Init phase
    pub fn init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = Some(timeout);
        self
    }

    /// Set a timeout for the Stop phase
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = Some(timeout);
        self
    }

    /// How long cancelled starters get to return before Start gives up on them
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Use the default configuration even if a module exposes one
    pub fn default_config(mut self) -> Self {
        self.default_config = true;
        self
    }

    /// Use the default logger even if a module exposes one
    pub fn default_logger(mut self) -> Self {
        self.default_logger = true;
        self
    }

    /// Build and initialize the application
    ///
    /// This will:
    /// 1. Register the configuration and the logger (first module exposing
    ///    them, or the defaults)
    /// 2. Call every Initializer in module order
    /// 3. Register every provided service, then seal the registry
    ///
    /// # Errors
    ///
    /// Returns the first Init or registration failure.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or logger cannot be registered.
    pub async fn build(self) -> Result<Application> {
        let container = Container::with_max_depth(self.max_resolve_depth);
        let mut defaults: Vec<Arc<dyn Module>> = Vec::new();

        let supplied_config = if self.default_config {
            None
        } else {
            self.modules.iter().find_map(|m| Arc::clone(m).as_config())
        };
        let config: Arc<dyn Config> = match supplied_config {
            Some(config) => config,
            None => {
                let config = Arc::new(EnvConfig::from_default_sources());
                defaults.push(config.clone());
                config
            }
        };
        if let Err(err) = container.provide(Provider::singleton(config)) {
            panic!("Configuration cannot be provided: {err}");
        }

        let supplied_logger = if self.default_logger {
            None
        } else {
            self.modules.iter().find_map(|m| Arc::clone(m).as_logger())
        };
        let logger: Arc<dyn Logger> = match supplied_logger {
            Some(logger) => logger,
            None => {
                let logger = Arc::new(TracingLogger::new());
                defaults.push(logger.clone());
                logger
            }
        };
        if let Err(err) = container.provide(Provider::singleton(logger)) {
            panic!("Logger cannot be provided: {err}");
        }

        let modules: Vec<Arc<dyn Module>> = defaults.into_iter().chain(self.modules).collect();
        for module in &modules {
            tracing::debug!(
                module = module.name(),
                capabilities = ?Capabilities::of(module),
                "Composing module"
            );
        }

        let app = Application {
            container: Arc::new(container),
            modules: modules.into(),
            cancel: self.cancel.unwrap_or_default(),
            stop_timeout: self.stop_timeout,
            shutdown_grace: self.shutdown_grace,
            started: Arc::new(AtomicBool::new(false)),
        };

        tracing::info!("Starting application initialization...");

        if let Some(timeout) = self.init_timeout {
            tokio::time::timeout(timeout, app.run_init_phase())
                .await
                .map_err(|_| {
                    LifecycleError::timeout(Phase::Init, format!("Timeout after {:?}", timeout))
                })??;
        } else {
            app.run_init_phase().await?;
        }

        app.run_provided_services_phase()?;

        tracing::info!("Application initialization complete");
        Ok(app)
    }
}
