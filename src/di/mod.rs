mod container;
mod extractor;
mod injectable;
mod provider;

pub use container::{Container, DEFAULT_MAX_RESOLVE_DEPTH, Resolver};
pub use extractor::{HasContainer, Inject};
pub use injectable::Injectable;
pub use provider::Provider;
