//! Route table
//!
//! Modules collect `(method, path, handler)` entries in a [`Routes`] table and
//! hand it to whichever module owns the HTTP server, which binds them with
//! [`Routes::into_router`].
//!
//! ```rust,ignore
//! let mut routes = Routes::new();
//! routes.get("/health", || async { "ok" });
//!
//! let mut api = Routes::new();
//! api.post("/users", create_user);
//! routes.add_from_routes(api);
//!
//! let router = routes.into_router().with_state(app);
//! ```

use axum::Router;
use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{self, MethodRouter};

/// One registered route
#[derive(Debug)]
pub struct RouteInfo<S = ()> {
    method: Method,
    path: String,
    handler: MethodRouter<S>,
}

impl<S> RouteInfo<S> {
    pub fn new(method: Method, path: impl Into<String>, handler: MethodRouter<S>) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &MethodRouter<S> {
        &self.handler
    }

    pub fn into_parts(self) -> (Method, String, MethodRouter<S>) {
        (self.method, self.path, self.handler)
    }
}

impl<S: Clone> Clone for RouteInfo<S> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            handler: self.handler.clone(),
        }
    }
}

/// Ordered list of routes waiting to be bound to a server
#[derive(Debug)]
pub struct Routes<S = ()> {
    routes: Vec<RouteInfo<S>>,
}

impl<S> Default for Routes<S> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<S: Clone> Clone for Routes<S> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
        }
    }
}

impl<S> Routes<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<H, T>(&mut self, path: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::GET, path, routing::get(handler))
    }

    pub fn post<H, T>(&mut self, path: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::POST, path, routing::post(handler))
    }

    pub fn put<H, T>(&mut self, path: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::PUT, path, routing::put(handler))
    }

    pub fn delete<H, T>(&mut self, path: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::DELETE, path, routing::delete(handler))
    }

    pub fn options<H, T>(&mut self, path: impl Into<String>, handler: H) -> &mut Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::OPTIONS, path, routing::options(handler))
    }

    /// Append a pre-built entry
    pub fn add(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: MethodRouter<S>,
    ) -> &mut Self {
        self.routes.push(RouteInfo::new(method, path, handler));
        self
    }

    /// Append every entry of `other`, keeping both tables' order
    pub fn add_from_routes(&mut self, other: Routes<S>) -> &mut Self {
        self.routes.extend(other.routes);
        self
    }

    pub fn routes_info(&self) -> &[RouteInfo<S>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Bind every entry on a fresh router.
    ///
    /// Entries sharing a path are merged into one method router.
    ///
    /// # Panics
    ///
    /// Panics if the same method is registered twice for a path.
    pub fn into_router(self) -> Router<S> {
        self.routes
            .into_iter()
            .fold(Router::new(), |router, route| {
                tracing::debug!(method = %route.method, path = %route.path, "Binding route");
                router.route(&route.path, route.handler)
            })
    }
}

impl<S> IntoIterator for Routes<S> {
    type Item = RouteInfo<S>;
    type IntoIter = std::vec::IntoIter<RouteInfo<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}
