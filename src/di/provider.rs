use crate::di::{Injectable, Resolver};
use crate::error::{ModulusError, Result};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Type-erased constructor stored in the container.
pub(crate) type ConstructFn =
    Arc<dyn Fn(&Resolver<'_>) -> Result<Box<dyn Any + Send>> + Send + Sync>;

/// A constructor value, keyed by the type it produces.
///
/// Modules hand these to the application from
/// [`ServiceProvider::provided_services`](crate::module::ServiceProvider::provided_services).
///
/// # Example
/// ```
/// use modulus::di::{Container, Provider};
///
/// struct Pool { size: usize }
/// struct Repository { pool: Pool }
///
/// let container = Container::new();
/// container.provide(Provider::from_fn(|| Pool { size: 4 })).unwrap();
/// container
///     .provide(Provider::new(|r| Ok(Repository { pool: r.resolve()? })))
///     .unwrap();
///
/// assert_eq!(container.resolve::<Repository>().unwrap().pool.size, 4);
/// ```
pub struct Provider {
    type_id: TypeId,
    type_name: &'static str,
    construct: ConstructFn,
}

impl Provider {
    /// Constructor resolving its parameters through the [`Resolver`].
    pub fn new<T, F>(constructor: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        Self::erase::<T>(Arc::new(move |resolver: &Resolver<'_>| {
            constructor(resolver).map(|value| Box::new(value) as Box<dyn Any + Send>)
        }))
    }

    /// Constructor paired with its own error type.
    ///
    /// Registry errors raised by nested resolutions come back out unchanged;
    /// anything else is reported as `ConstructorFailed`.
    pub fn fallible<T, E, F>(constructor: F) -> Self
    where
        T: Send + 'static,
        E: Into<anyhow::Error>,
        F: Fn(&Resolver<'_>) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        Self::erase::<T>(Arc::new(move |resolver: &Resolver<'_>| match constructor(resolver) {
            Ok(value) => Ok(Box::new(value) as Box<dyn Any + Send>),
            Err(err) => Err(ModulusError::constructor(type_name, err)),
        }))
    }

    /// Constructor without parameters.
    pub fn from_fn<T, F>(constructor: F) -> Self
    where
        T: Send + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(move |_| Ok(constructor()))
    }

    /// Constructor closing over an existing value; every resolution yields a
    /// clone of it, so `Arc` values resolve to the same object every time.
    pub fn singleton<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Constructor delegating to [`Injectable::inject`].
    pub fn injectable<T: Injectable>() -> Self {
        Self::new(T::inject)
    }

    fn erase<T: 'static>(construct: ConstructFn) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            construct,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the produced type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn into_construct(self) -> ConstructFn {
        self.construct
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("type_name", &self.type_name)
            .finish()
    }
}
