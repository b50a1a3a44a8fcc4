//! Route matching result.

/// Handlers and parameters produced by a successful lookup.
///
/// A fresh value is built for every lookup. Handlers borrow from the router
/// that owns them, parameter names from the router's compiled tables and
/// parameter values from the request path.
#[derive(Debug, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// Handlers to run, in registration order.
    pub handlers: Vec<&'a T>,
    /// Extracted path parameters as `(name, value)` pairs.
    pub params: Vec<(&'a str, &'a str)>,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Create a match from handlers and parameters.
    #[must_use]
    pub fn new(handlers: Vec<&'a T>, params: Vec<(&'a str, &'a str)>) -> Self {
        Self { handlers, params }
    }

    /// Get a parameter value by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Whether any parameter was extracted.
    #[must_use]
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }
}

impl<T> Clone for RouteMatch<'_, T> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            params: self.params.clone(),
        }
    }
}
