use crate::di::Provider;
use crate::di::provider::ConstructFn;
use crate::error::{ModulusError, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::TypeId;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default bound on nested resolutions before a graph is treated as cyclic.
pub const DEFAULT_MAX_RESOLVE_DEPTH: usize = 64;

struct ConstructorEntry {
    type_name: &'static str,
    construct: ConstructFn,
}

/// Thread-safe registry of constructors keyed by the type they produce.
///
/// Registration is only allowed until the container is sealed; after that it
/// is a read-only lookup table that can be shared across tasks.
pub struct Container {
    constructors: DashMap<TypeId, ConstructorEntry>,
    sealed: AtomicBool,
    max_depth: usize,
}

impl Container {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_RESOLVE_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            constructors: DashMap::new(),
            sealed: AtomicBool::new(false),
            max_depth,
        }
    }

    /// Register a constructor under the type it produces.
    ///
    /// # Errors
    /// - `DuplicateRegistration` if a constructor for the type already exists
    /// - `InvalidConstructor` if the constructor produces `()`
    /// - `RegistrySealed` once the container has been sealed
    pub fn provide(&self, provider: Provider) -> Result<()> {
        let type_name = provider.type_name();

        if self.is_sealed() {
            return Err(ModulusError::RegistrySealed { type_name });
        }
        if provider.type_id() == TypeId::of::<()>() {
            return Err(ModulusError::InvalidConstructor {
                type_name,
                reason: "constructor does not produce a value",
            });
        }

        match self.constructors.entry(provider.type_id()) {
            Entry::Occupied(_) => Err(ModulusError::DuplicateRegistration { type_name }),
            Entry::Vacant(slot) => {
                tracing::trace!(type_name, "Registered constructor");
                slot.insert(ConstructorEntry {
                    type_name,
                    construct: provider.into_construct(),
                });
                Ok(())
            }
        }
    }

    /// Resolve a value of type `T` by invoking its constructor.
    ///
    /// Constructor parameters are resolved depth-first. Nothing is cached:
    /// each call constructs a fresh value unless the provider closes over one.
    pub fn resolve<T: Send + 'static>(&self) -> Result<T> {
        self.resolve_at::<T>(0)
    }

    pub(crate) fn resolve_at<T: Send + 'static>(&self, depth: usize) -> Result<T> {
        let type_name = std::any::type_name::<T>();
        if depth > self.max_depth {
            return Err(ModulusError::CyclicDependency { type_name, depth });
        }

        // Clone the constructor out so no shard lock is held while it runs
        // and resolves its own parameters.
        let construct = self
            .constructors
            .get(&TypeId::of::<T>())
            .map(|entry| entry.construct.clone())
            .ok_or(ModulusError::UnresolvedDependency { type_name })?;

        let resolver = Resolver {
            container: self,
            depth,
        };
        let value = construct(&resolver)?;

        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ModulusError::DowncastFailed { type_name })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.constructors.contains_key(&TypeId::of::<T>())
    }

    /// Names of all registered types, in no particular order.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.constructors
            .iter()
            .map(|entry| entry.value().type_name)
            .collect()
    }

    /// Make the container read-only.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("types", &self.type_names())
            .field("sealed", &self.is_sealed())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Handle given to constructors for resolving their own parameters.
pub struct Resolver<'c> {
    container: &'c Container,
    depth: usize,
}

impl<'c> Resolver<'c> {
    /// Resolve a parameter one level below the value being constructed.
    pub fn resolve<T: Send + 'static>(&self) -> Result<T> {
        self.container.resolve_at::<T>(self.depth + 1)
    }

    /// How many constructors are currently on the resolution stack above this one.
    pub fn depth(&self) -> usize {
        self.depth
    }
}
