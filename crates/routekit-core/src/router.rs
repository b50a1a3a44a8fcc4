//! The contract implemented by every routing engine.

use crate::error::RouterError;
use crate::r#match::RouteMatch;

/// A method and path router holding handlers of type `T`.
///
/// Registration takes `&mut self`; lookups take `&self` so a populated router
/// can be shared between threads.
pub trait Router<T> {
    /// Short engine name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Register `handler` for `method` and the path `pattern`.
    ///
    /// Pattern syntax: literal components, `/:name`, `/:name{regex}`, `/*`
    /// and the bare `*`.
    fn add(&mut self, method: &str, pattern: &str, handler: T) -> Result<(), RouterError>;

    /// Look up the handlers and parameters for `method` and `path`.
    ///
    /// Returns `Ok(None)` when nothing matches. Errors only report route
    /// declaration mistakes discovered while compiling.
    fn match_path<'a>(
        &'a self,
        method: &str,
        path: &'a str,
    ) -> Result<Option<RouteMatch<'a, T>>, RouterError>;
}
