use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModulusError>;

/// Errors raised by the dependency registry.
#[derive(Debug, Error)]
pub enum ModulusError {
    #[error("Type already registered: {type_name}")]
    DuplicateRegistration { type_name: &'static str },

    #[error("Invalid constructor for {type_name}: {reason}")]
    InvalidConstructor {
        type_name: &'static str,
        reason: &'static str,
    },

    #[error("Dependency not found: {type_name}")]
    UnresolvedDependency { type_name: &'static str },

    #[error("Resolution depth {depth} exceeded while resolving {type_name} (cyclic dependency?)")]
    CyclicDependency { type_name: &'static str, depth: usize },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: &'static str },

    #[error("Registry is sealed, cannot register {type_name}")]
    RegistrySealed { type_name: &'static str },

    #[error("Constructor for {type_name} failed: {source}")]
    ConstructorFailed {
        type_name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ModulusError {
    /// Wraps an arbitrary constructor error.
    ///
    /// Registry errors that travelled through `anyhow` (a constructor using `?`
    /// on a nested resolution) are unwrapped back into themselves so callers
    /// still see the original kind.
    pub fn constructor(type_name: &'static str, err: impl Into<anyhow::Error>) -> Self {
        match err.into().downcast::<ModulusError>() {
            Ok(registry_err) => registry_err,
            Err(source) => Self::ConstructorFailed { type_name, source },
        }
    }

    /// Name of the type the error is about.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DuplicateRegistration { type_name }
            | Self::InvalidConstructor { type_name, .. }
            | Self::UnresolvedDependency { type_name }
            | Self::CyclicDependency { type_name, .. }
            | Self::DowncastFailed { type_name }
            | Self::RegistrySealed { type_name }
            | Self::ConstructorFailed { type_name, .. } => type_name,
        }
    }
}
