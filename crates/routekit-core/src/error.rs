//! Route declaration errors.

use thiserror::Error;

/// Errors raised while registering or compiling routes.
///
/// Every variant points at a mistake in the route declarations. A path that
/// simply matches nothing is reported as `Ok(None)` by the routers, never as
/// one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Two routes overlap and neither is strictly more specific.
    #[error("unsupported path: {path}")]
    UnsupportedPattern {
        /// The pattern that could not be ordered against another route.
        path: String,
    },
    /// A parameter name is bound to two different positions.
    #[error("duplicate param name '{name}' in {path}")]
    DuplicateParameterName {
        /// The conflicting parameter name.
        name: String,
        /// The pattern carrying the conflict.
        path: String,
    },
    /// `add` was called after the matcher was built.
    #[error("can not add a route since the matcher is already built")]
    Frozen,
    /// A pattern or one of its constraints is not a valid expression.
    #[error("invalid pattern {path}: {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        path: String,
        /// Why the pattern was rejected.
        reason: String,
    },
}

impl RouterError {
    /// Create an [`RouterError::UnsupportedPattern`] error.
    #[must_use]
    pub fn unsupported(path: impl Into<String>) -> Self {
        Self::UnsupportedPattern { path: path.into() }
    }

    /// Create a [`RouterError::DuplicateParameterName`] error.
    #[must_use]
    pub fn duplicate_param(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::DuplicateParameterName {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Create an [`RouterError::InvalidPattern`] error.
    #[must_use]
    pub fn invalid(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RouterError::unsupported("/:a/foo").to_string(),
            "unsupported path: /:a/foo"
        );
        assert_eq!(
            RouterError::duplicate_param("id", "/:id/:id").to_string(),
            "duplicate param name 'id' in /:id/:id"
        );
        assert_eq!(
            RouterError::Frozen.to_string(),
            "can not add a route since the matcher is already built"
        );
        assert_eq!(
            RouterError::invalid("/user", "bad").to_string(),
            "invalid pattern /user: bad"
        );
    }

    #[test]
    fn test_errors_are_cloneable() {
        let err = RouterError::unsupported("/x");
        assert_eq!(err.clone(), err);
    }
}
