use crate::di::Container;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode as HttpStatusCode, request::Parts},
};

/// Axum extractor for dependency injection
///
/// Resolves `T` from the container of the router state for every request,
/// so handlers receive values built by the registered constructors.
///
/// # Example
/// ```ignore
/// use modulus::di::Inject;
///
/// async fn greet(Inject(greeter): Inject<Greeter>) -> String {
///     greeter.greet()
/// }
///
/// let router = routes.into_router().with_state(app);
/// ```
pub struct Inject<T>(pub T);

/// Trait that router state must implement to provide the DI container
pub trait HasContainer {
    fn get_container(&self) -> &Container;
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: Send + 'static,
{
    type Rejection = (HttpStatusCode, String);

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let container = state.get_container();

        container.resolve::<T>().map(Inject).map_err(|e| {
            tracing::error!(error = %e, "Dependency injection failed");
            (
                HttpStatusCode::INTERNAL_SERVER_ERROR,
                format!("Dependency injection failed: {}", e),
            )
        })
    }
}

/// Deref implementation for convenient access to the inner value
impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
