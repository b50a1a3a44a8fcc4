//! Path pattern analysis.
//!
//! A pattern such as `/user/:id{[0-9]+}/*` is split into `/`-delimited
//! [`Component`]s and summarized into a [`Hint`]: the per-position shapes
//! used to compare routes, the logical length, and the named parameters.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use routekit_core::RouterError;

/// Expression a parameter without an explicit constraint must satisfy.
pub(crate) const LABEL_PATTERN: &str = "[^/]+";

static COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?::\w+\{[^}]+\}|[^/]*)").expect("component expression is valid")
});

static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/:(\w+)(?:\{([^}]+)\})?$").expect("parameter expression is valid")
});

/// One `/`-delimited piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Component {
    /// Literal text, including the leading `/`.
    Literal(String),
    /// A named parameter and the expression its value must match.
    Param { name: String, constraint: String },
    /// A bare `/*`.
    Wildcard,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Param { name, constraint } if constraint == LABEL_PATTERN => {
                write!(f, "/:{name}")
            }
            Self::Param { name, constraint } => write!(f, "/:{name}{{{constraint}}}"),
            Self::Wildcard => f.write_str("/*"),
        }
    }
}

/// What a route accepts at one logical position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Exactly this text.
    Literal(String),
    /// Any single segment.
    Any,
    /// A segment matching this expression.
    Constrained(String),
}

/// A named parameter bound at a component position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NamedParam {
    pub index: usize,
    pub name: String,
    pub constraint: String,
}

/// Cached analysis of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hint {
    /// All components, a trailing wildcard included.
    pub components: Vec<Component>,
    /// One shape per logical component.
    pub shapes: Vec<Shape>,
    /// Logical component count; a trailing `/*` is not counted.
    pub len: usize,
    pub ends_with_wildcard: bool,
    /// Positions holding a parameter or a wildcard.
    pub param_indexes: Vec<usize>,
    pub named_params: Vec<NamedParam>,
}

impl Hint {
    /// Whether the pattern matches exactly one path.
    pub fn is_static(&self) -> bool {
        !self.ends_with_wildcard
            && self
                .components
                .iter()
                .all(|c| matches!(c, Component::Literal(_)))
    }

    /// Render the components back into pattern syntax.
    #[cfg(test)]
    pub fn render(&self) -> String {
        if self.components.is_empty() && self.ends_with_wildcard {
            return "*".to_string();
        }
        self.components.iter().map(ToString::to_string).collect()
    }
}

/// Analyze a pattern into its [`Hint`].
///
/// The bare `*` matches everything and has no components. Any other pattern
/// must start with `/`; `*` is only allowed as a whole component.
pub(crate) fn analyze(path: &str) -> Result<Hint, RouterError> {
    if path == "*" {
        return Ok(Hint {
            components: Vec::new(),
            shapes: Vec::new(),
            len: 0,
            ends_with_wildcard: true,
            param_indexes: Vec::new(),
            named_params: Vec::new(),
        });
    }
    if !path.starts_with('/') {
        return Err(RouterError::invalid(path, "pattern must start with '/'"));
    }

    let raw: Vec<&str> = COMPONENT_RE.find_iter(path).map(|m| m.as_str()).collect();
    if raw.concat() != path {
        return Err(RouterError::invalid(path, "malformed parameter"));
    }

    let count = raw.len();
    let mut hint = Hint {
        components: Vec::with_capacity(count),
        shapes: Vec::with_capacity(count),
        len: count,
        ends_with_wildcard: path.ends_with("/*"),
        param_indexes: Vec::new(),
        named_params: Vec::new(),
    };

    for (i, text) in raw.into_iter().enumerate() {
        if i + 1 == count && text == "/*" {
            hint.len -= 1;
            hint.components.push(Component::Wildcard);
            break;
        }

        if let Some(caps) = PARAM_RE.captures(text) {
            let name = caps[1].to_string();
            let constraint = caps.get(2).map_or(LABEL_PATTERN, |m| m.as_str());
            validate_constraint(path, constraint)?;
            hint.shapes.push(if constraint == LABEL_PATTERN {
                Shape::Any
            } else {
                Shape::Constrained(constraint.to_string())
            });
            hint.param_indexes.push(i);
            hint.named_params.push(NamedParam {
                index: i,
                name: name.clone(),
                constraint: constraint.to_string(),
            });
            hint.components.push(Component::Param {
                name,
                constraint: constraint.to_string(),
            });
        } else if text == "/*" {
            hint.shapes.push(Shape::Any);
            hint.param_indexes.push(i);
            hint.components.push(Component::Wildcard);
        } else if text.contains('*') {
            return Err(RouterError::invalid(
                path,
                "'*' must be a whole path component",
            ));
        } else {
            hint.shapes.push(Shape::Literal(text.to_string()));
            hint.components.push(Component::Literal(text.to_string()));
        }
    }

    Ok(hint)
}

fn validate_constraint(path: &str, constraint: &str) -> Result<(), RouterError> {
    Regex::new(&format!("^(?:{constraint})$"))
        .map(drop)
        .map_err(|err| RouterError::invalid(path, err))
}
