//! Segment trie router.
//!
//! [`TrieRouter`] stores patterns in a tree keyed by `/`-separated segments
//! and answers lookups with a backtracking walk. Nothing is precompiled, so
//! routes can be added at any time; lookup cost grows with path depth and
//! the number of wildcards on the way.
//!
//! Every viable branch contributes: a lookup returns the handlers of every
//! terminal the path reaches, ordered by registration score.
//!
//! # Example
//!
//! ```
//! use routekit_router::{TrieRouter, Router};
//!
//! let mut router = TrieRouter::new();
//! router.add("ALL", "/api/*", "auth").unwrap();
//! router.add("GET", "/api/users/:id", "get_user").unwrap();
//!
//! let m = router.match_path("GET", "/api/users/7").unwrap().unwrap();
//! assert_eq!(m.handlers, vec![&"auth", &"get_user"]);
//! assert_eq!(m.param("id"), Some("7"));
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::ptr;

use regex::Regex;
use routekit_core::{RouteMatch, Router, RouterConfig, RouterError};
use tracing::trace;

use crate::pattern::{Component, LABEL_PATTERN, analyze};

/// Orders two handler scores.
pub type ScoreComparator = Box<dyn Fn(u64, u64) -> Ordering + Send + Sync>;

/// Computes a handler's score from the pattern it was registered with.
pub type PathScorer = Box<dyn Fn(&str) -> u64 + Send + Sync>;

/// A handler stored at a terminal node.
struct Registered<T> {
    /// Registration order, unique per router.
    id: u64,
    score: u64,
    handler: T,
}

/// The parametric child of a node.
struct ParamChild<T> {
    name: String,
    pattern: String,
    /// `None` for the default single-segment constraint.
    regex: Option<Regex>,
    node: Node<T>,
}

impl<T> ParamChild<T> {
    fn accepts(&self, segment: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(segment),
            None => !segment.is_empty(),
        }
    }
}

struct Node<T> {
    literals: HashMap<String, Node<T>>,
    param: Option<Box<ParamChild<T>>>,
    wildcard: Option<Box<Node<T>>>,
    /// Per-method handlers of routes ending here.
    handlers: HashMap<String, Vec<Registered<T>>>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            literals: HashMap::new(),
            param: None,
            wildcard: None,
            handlers: HashMap::new(),
        }
    }
}

/// Accumulated result of one lookup.
struct Walk<'m, 'a, T> {
    method: &'m str,
    catch_all: &'a str,
    stack: Vec<(&'a str, &'a str)>,
    /// `(id, score, handler)`, possibly repeated.
    handlers: Vec<(u64, u64, &'a T)>,
    params: Vec<(&'a str, &'a str)>,
    /// `(node, remaining segments)` states already explored.
    visited: HashSet<(*const Node<T>, usize)>,
}

impl<'a, T> Walk<'_, 'a, T> {
    fn collect(&mut self, node: &'a Node<T>) {
        let own = node.handlers.get(self.method);
        let fallback = if self.method == self.catch_all {
            None
        } else {
            node.handlers.get(self.catch_all)
        };

        let before = self.handlers.len();
        for list in own.into_iter().chain(fallback) {
            self.handlers
                .extend(list.iter().map(|r| (r.id, r.score, &r.handler)));
        }
        if self.handlers.len() == before {
            return;
        }

        for &(name, value) in &self.stack {
            if !self.params.iter().any(|(bound, _)| *bound == name) {
                self.params.push((name, value));
            }
        }
    }

    fn descend(&mut self, node: &'a Node<T>, segments: &[&'a str]) {
        // A revisited state yields the same handlers and bindings, unless the
        // current stack carries a name not bound yet.
        if !self.visited.insert((ptr::from_ref(node), segments.len()))
            && self
                .stack
                .iter()
                .all(|(name, _)| self.params.iter().any(|(bound, _)| bound == name))
        {
            return;
        }

        let Some((&head, rest)) = segments.split_first() else {
            self.collect(node);
            self.wildcard(node, segments);
            return;
        };

        if let Some(child) = node.literals.get(head) {
            self.descend(child, rest);
        }

        if let Some(param) = node.param.as_deref() {
            if param.accepts(head) {
                self.stack.push((param.name.as_str(), head));
                self.descend(&param.node, rest);
                self.stack.pop();
            }
        }

        self.wildcard(node, segments);
    }

    /// The wildcard absorbs zero or more segments; its subtree matches the
    /// rest.
    fn wildcard(&mut self, node: &'a Node<T>, segments: &[&'a str]) {
        if let Some(child) = node.wildcard.as_deref() {
            for skip in 0..=segments.len() {
                self.descend(child, &segments[skip..]);
            }
        }
    }
}

/// Router walking a segment trie at lookup time.
pub struct TrieRouter<T> {
    config: RouterConfig,
    root: Node<T>,
    count: u64,
    scorer: Option<PathScorer>,
    comparator: ScoreComparator,
}

impl<T> TrieRouter<T> {
    /// Create an empty router with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Create an empty router.
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            root: Node::default(),
            count: 0,
            scorer: None,
            comparator: Box::new(|a, b| a.cmp(&b)),
        }
    }

    /// Order handlers by `comparator` instead of ascending registration
    /// score.
    #[must_use]
    pub fn with_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(u64, u64) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Box::new(comparator);
        self
    }

    /// Score handlers with `scorer`, called with the registered pattern,
    /// instead of the registration counter.
    ///
    /// Handlers with equal scores keep registration order.
    #[must_use]
    pub fn with_scorer<F>(mut self, scorer: F) -> Self
    where
        F: Fn(&str) -> u64 + Send + Sync + 'static,
    {
        self.scorer = Some(Box::new(scorer));
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Number of handlers registered.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(self.count).unwrap_or(usize::MAX)
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<T> Default for TrieRouter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TrieRouter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrieRouter")
            .field("config", &self.config)
            .field("handlers", &self.count)
            .finish_non_exhaustive()
    }
}

impl<T> Router<T> for TrieRouter<T> {
    fn name(&self) -> &'static str {
        "TrieRouter"
    }

    fn add(&mut self, method: &str, pattern: &str, handler: T) -> Result<(), RouterError> {
        let hint = analyze(pattern)?;

        let mut seen = HashSet::new();
        if let Some(dup) = hint.named_params.iter().find(|p| !seen.insert(&p.name)) {
            return Err(RouterError::duplicate_param(&dup.name, pattern));
        }

        let catch_all = [Component::Wildcard];
        let components = if hint.components.is_empty() {
            &catch_all[..]
        } else {
            &hint.components[..]
        };

        let mut node = &mut self.root;
        for component in components {
            node = match component {
                Component::Literal(text) => node.literals.entry(text[1..].to_string()).or_default(),
                Component::Wildcard => &mut **node.wildcard.get_or_insert_with(Box::default),
                Component::Param { name, constraint } => {
                    if node.param.is_none() {
                        node.param = Some(Box::new(param_child(pattern, name, constraint)?));
                    }
                    let Some(param) = node.param.as_deref_mut() else {
                        return Err(RouterError::unsupported(pattern));
                    };
                    if param.name != *name || param.pattern != *constraint {
                        return Err(RouterError::unsupported(pattern));
                    }
                    &mut param.node
                }
            };
        }

        self.count += 1;
        let id = self.count;
        let score = self.scorer.as_ref().map_or(id, |scorer| scorer(pattern));
        node.handlers
            .entry(method.to_string())
            .or_default()
            .push(Registered { id, score, handler });
        trace!(method, pattern, id, score, "route registered");
        Ok(())
    }

    fn match_path<'a>(
        &'a self,
        method: &str,
        path: &'a str,
    ) -> Result<Option<RouteMatch<'a, T>>, RouterError> {
        let segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();

        let mut walk = Walk {
            method,
            catch_all: self.config.catch_all_method.as_str(),
            stack: Vec::new(),
            handlers: Vec::new(),
            params: Vec::new(),
            visited: HashSet::new(),
        };
        walk.descend(&self.root, &segments);

        if walk.handlers.is_empty() {
            return Ok(None);
        }

        let mut handlers = walk.handlers;
        handlers.sort_unstable_by_key(|(id, _, _)| *id);
        handlers.dedup_by_key(|(id, _, _)| *id);
        handlers.sort_by(|(_, a, _), (_, b, _)| (self.comparator)(*a, *b));

        Ok(Some(RouteMatch::new(
            handlers.into_iter().map(|(_, _, h)| h).collect(),
            walk.params,
        )))
    }
}

fn param_child<T>(pattern: &str, name: &str, constraint: &str) -> Result<ParamChild<T>, RouterError> {
    let regex = if constraint == LABEL_PATTERN {
        None
    } else {
        Some(Regex::new(&format!("^(?:{constraint})$")).map_err(|err| RouterError::invalid(pattern, err))?)
    };
    Ok(ParamChild {
        name: name.to_string(),
        pattern: constraint.to_string(),
        regex,
        node: Node::default(),
    })
}
