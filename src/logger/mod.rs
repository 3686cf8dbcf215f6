//! Logger capability
//!
//! Modules log through [`Application::logger`](crate::Application::logger).
//! The default [`TracingLogger`] forwards every record to `tracing`, so the
//! subscriber installed with [`init_tracing`] decides formatting and filtering.

use crate::module::Module;
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Panic,
}

/// Leveled text logger
///
/// Only [`Logger::log`] is required. `error` and `panic` emit the record and
/// then terminate the process with exit status 1; use `log` with
/// [`LogLevel::Error`] to report an error without exiting.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: fmt::Arguments<'_>);

    fn debug(&self, message: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: fmt::Arguments<'_>) -> ! {
        self.log(LogLevel::Error, message);
        std::process::exit(1)
    }

    fn panic(&self, message: fmt::Arguments<'_>) -> ! {
        self.log(LogLevel::Panic, message);
        std::process::exit(1)
    }
}

/// Default logger, emitting `tracing` events under the `modulus::app` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: fmt::Arguments<'_>) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "modulus::app", "{message}"),
            LogLevel::Info => tracing::info!(target: "modulus::app", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "modulus::app", "{message}"),
            LogLevel::Error | LogLevel::Panic => {
                tracing::error!(target: "modulus::app", %level, "{message}")
            }
        }
    }
}

impl Module for TracingLogger {
    fn name(&self) -> &str {
        "TracingLogger"
    }

    fn as_logger(self: Arc<Self>) -> Option<Arc<dyn Logger>> {
        Some(self)
    }
}

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_directives` (e.g. `"info,modulus=debug"`).
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_directives: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish()
        .try_init()
        .is_ok()
}
