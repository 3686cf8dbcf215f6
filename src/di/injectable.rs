use crate::di::Resolver;
use crate::error::Result;

/// Trait for types that can be built out of the dependency registry
///
/// This trait is typically implemented automatically via the `#[derive(Injectable)]` macro
/// and registered with [`Provider::injectable`](crate::di::Provider::injectable).
///
/// # Example
/// ```ignore
/// use modulus::DeriveInjectable as Injectable;
/// use std::sync::Arc;
///
/// trait UserRepository: Send + Sync {}
///
/// // Each field is resolved by its type
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
/// }
/// ```
pub trait Injectable: Sized + Send + 'static {
    /// Create an instance by resolving dependencies through the resolver
    ///
    /// # Errors
    /// Returns an error if any required dependency is not registered or fails to construct.
    fn inject(resolver: &Resolver<'_>) -> Result<Self>;
}
