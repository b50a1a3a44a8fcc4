//! Router configuration.

use serde::{Deserialize, Serialize};

/// Reserved method token matching any method when no exact-method route does.
pub const METHOD_NAME_ALL: &str = "ALL";

/// Default upper bound, in bytes, for a compiled matcher expression.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Configuration shared by the routing engines.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// use routekit_core::RouterConfig;
///
/// let config = RouterConfig::new().catch_all_method("ANY");
/// assert!(config.is_catch_all("ANY"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Method token that registers a route for every method.
    pub catch_all_method: String,
    /// Size limit forwarded to the regex compiler for combined matchers.
    pub regex_size_limit: usize,
}

impl RouterConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the catch-all method token.
    #[must_use]
    pub fn catch_all_method(mut self, method: impl Into<String>) -> Self {
        self.catch_all_method = method.into();
        self
    }

    /// Set the compiled expression size limit.
    #[must_use]
    pub fn regex_size_limit(mut self, limit: usize) -> Self {
        self.regex_size_limit = limit;
        self
    }

    /// Check whether `method` is the catch-all token.
    #[must_use]
    pub fn is_catch_all(&self, method: &str) -> bool {
        self.catch_all_method == method
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            catch_all_method: METHOD_NAME_ALL.to_string(),
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}
