//! Lifecycle-specific error types

use super::Phase;
use crate::error::ModulusError;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while constructing, starting or stopping an application
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A module's Init failed; construction stopped at that module
    #[error("Initialization failed for {module}: {source}")]
    Initialization {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    /// Registering one of a module's provided services failed
    #[error("Service registration failed for {module}: {source}")]
    ProvideServices {
        module: String,
        #[source]
        source: ModulusError,
    },

    /// One or more starters failed
    #[error(transparent)]
    Start(AggregateError),

    /// One or more stoppers failed
    #[error(transparent)]
    Stop(AggregateError),

    /// The root cancellation token fired and some modules did not return
    /// within the shutdown grace period
    #[error("{phase} phase cancelled with {} module(s) still running", pending.len())]
    Cancelled {
        phase: Phase,
        /// Modules whose task is still running; it has been left detached
        pending: Vec<String>,
        /// Failures of the modules that did return
        failures: Vec<ModuleFailure>,
    },

    /// Operation timed out
    #[error("Timeout during {phase}: {message}")]
    Timeout { phase: Phase, message: String },

    /// Stop was requested before any Start
    #[error("Application has not been started")]
    NotStarted,
}

impl LifecycleError {
    /// Create a timeout error
    pub fn timeout(phase: Phase, message: impl Into<String>) -> Self {
        Self::Timeout {
            phase,
            message: message.into(),
        }
    }

    /// The aggregated module failures, for Start and Stop errors.
    pub fn aggregate(&self) -> Option<&AggregateError> {
        match self {
            Self::Start(aggregate) | Self::Stop(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}

/// A single module's failure inside a concurrent phase
#[derive(Debug)]
pub struct ModuleFailure {
    pub module: String,
    pub error: anyhow::Error,
}

impl ModuleFailure {
    pub fn new(module: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            module: module.into(),
            error,
        }
    }
}

impl fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module, self.error)
    }
}

/// Every failure of a Start or Stop phase, in module order
#[derive(Debug)]
pub struct AggregateError {
    phase: Phase,
    failures: Vec<ModuleFailure>,
}

impl AggregateError {
    pub fn new(phase: Phase, failures: Vec<ModuleFailure>) -> Self {
        Self { phase, failures }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn failures(&self) -> &[ModuleFailure] {
        &self.failures
    }

    /// Names of the failed modules.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.module.as_str())
    }

    pub fn into_failures(self) -> Vec<ModuleFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {} module(s): ",
            self.phase,
            self.failures.len()
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
