use proc_macro::TokenStream;

mod injectable;

/// Derive macro for building a struct out of the dependency registry
///
/// Every named field is resolved by its type through the `Resolver` handed to
/// the constructor, so each field type must itself be registered.
///
/// # Example
/// ```ignore
/// use modulus::DeriveInjectable as Injectable;
/// use std::sync::Arc;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
///     config: Arc<dyn modulus::Config>,
/// }
/// ```
#[proc_macro_derive(Injectable)]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
