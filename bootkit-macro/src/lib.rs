use proc_macro::TokenStream;

mod module;

/// Attribute macro declaring a module's dependencies
///
/// Generates the `bootkit::ModuleType` impl: each listed module is
/// registered as a dependency, in order, and the instance is built with
/// `Default::default()` or with the function given as `create`.
/// The `bootkit::Module` impl (the lifecycle hooks) is still written by hand.
///
/// # Example
/// ```ignore
/// use bootkit::prelude::*;
///
/// #[derive(Default)]
/// #[module(depends_on = [DatabaseModule, CacheModule])]
/// pub struct UserModule;
///
/// #[module(depends_on = [UserModule], create = AppModule::new)]
/// pub struct AppModule {
///     started: std::time::Instant,
/// }
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}
