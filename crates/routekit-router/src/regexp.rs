//! Compiled-regex router.
//!
//! [`RegExpRouter`] collects routes until the first lookup, then resolves and
//! compiles every method into a single expression and freezes. The router is
//! an explicit two-state machine:
//!
//! - **Unbuilt**: registration data behind a mutex, open to [`Router::add`]
//! - **Built**: immutable matchers in a [`OnceLock`], shared by lookups
//!
//! The transition happens at most once, on whichever of
//! [`Router::match_path`], [`RegExpRouter::build`] or
//! [`RegExpRouter::static_routes`] runs first. Compilation errors are
//! memoized with the artifact, so every later lookup reports the same error.
//!
//! # Example
//!
//! ```
//! use routekit_router::{RegExpRouter, Router};
//!
//! let mut router = RegExpRouter::new();
//! router.add("GET", "/user/:id{[0-9]+}", "get_user").unwrap();
//!
//! let m = router.match_path("GET", "/user/42").unwrap().unwrap();
//! assert_eq!(m.handlers, vec![&"get_user"]);
//! assert_eq!(m.param("id"), Some("42"));
//! assert!(router.match_path("GET", "/user/abc").unwrap().is_none());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use parking_lot::Mutex;
use regex::Captures;
use routekit_core::{RouteMatch, Router, RouterConfig, RouterError};
use tracing::{debug, trace, warn};

use crate::compiler::{Branch, MethodMatchers, compile};
use crate::pattern::analyze;
use crate::relation::{Route, resolve};

/// Registration data of an unbuilt router.
#[derive(Debug, Default)]
struct Registry {
    routes: Vec<Route>,
    methods: BTreeSet<String>,
}

/// Matchers of a built router, keyed by method.
#[derive(Debug)]
struct Compiled {
    methods: HashMap<String, MethodMatchers>,
}

impl Compiled {
    /// Primary matcher of the method (or the catch-all method), then the
    /// method's secondary matchers, then the catch-all secondary matchers.
    fn lookup<'p>(
        &self,
        method: &str,
        catch_all: &str,
        path: &'p str,
    ) -> Option<(&Branch, Captures<'p>)> {
        let own = self.methods.get(method);
        let fallback = self.methods.get(catch_all);

        if let Some(hit) = own
            .or(fallback)
            .and_then(|m| m.primary.as_ref())
            .and_then(|matcher| matcher.exec(path))
        {
            return Some(hit);
        }

        own.into_iter()
            .chain(fallback.filter(|_| method != catch_all))
            .flat_map(|m| m.secondary.iter())
            .find_map(|matcher| matcher.exec(path))
    }
}

/// Router compiling all routes of a method into one regular expression.
///
/// Lookup cost does not grow with the number of routes beyond the size of
/// the expression. The handler type needs no bounds: handlers are stored
/// once and matches borrow them.
pub struct RegExpRouter<T> {
    config: RouterConfig,
    handlers: Vec<T>,
    registry: Mutex<Option<Registry>>,
    compiled: OnceLock<Result<Compiled, RouterError>>,
}

impl<T> RegExpRouter<T> {
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
            handlers: Vec::new(),
            registry: Mutex::new(Some(Registry::default())),
            compiled: OnceLock::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Whether the matcher has been built and registration is closed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Number of handlers registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolve and compile all routes now instead of on the first lookup.
    ///
    /// Idempotent: later calls return the memoized outcome.
    pub fn build(&self) -> Result<(), RouterError> {
        self.compiled().map(|_| ())
    }

    /// Exact-path fast path: for every method, the match produced for each
    /// pattern without parameters or wildcards.
    ///
    /// Builds the router if needed.
    pub fn static_routes(
        &self,
    ) -> Result<HashMap<String, HashMap<String, RouteMatch<'_, T>>>, RouterError> {
        let compiled = self.compiled()?;
        let mut out = HashMap::with_capacity(compiled.methods.len());
        for (method, matchers) in &compiled.methods {
            let routes = matchers
                .static_paths
                .iter()
                .filter_map(|path| {
                    self.lookup(compiled, method, path)
                        .map(|m| (path.clone(), m))
                })
                .collect();
            out.insert(method.clone(), routes);
        }
        Ok(out)
    }

    fn compiled(&self) -> Result<&Compiled, RouterError> {
        self.compiled
            .get_or_init(|| {
                let registry = self.registry.lock().take().unwrap_or_default();
                build_all(registry, &self.config)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    fn lookup<'a>(
        &'a self,
        compiled: &'a Compiled,
        method: &str,
        path: &'a str,
    ) -> Option<RouteMatch<'a, T>> {
        let (branch, caps) = compiled.lookup(method, &self.config.catch_all_method, path)?;
        let handlers = branch.handlers.iter().map(|&i| &self.handlers[i]).collect();
        let params = match &branch.params {
            None => Vec::new(),
            Some(map) => map
                .iter()
                .filter_map(|(group, name)| caps.get(*group).map(|m| (name.as_str(), m.as_str())))
                .collect(),
        };
        Some(RouteMatch::new(handlers, params))
    }
}

impl<T> Default for RegExpRouter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for RegExpRouter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegExpRouter")
            .field("config", &self.config)
            .field("handlers", &self.handlers.len())
            .field("built", &self.is_built())
            .finish()
    }
}

impl<T> Router<T> for RegExpRouter<T> {
    fn name(&self) -> &'static str {
        "RegExpRouter"
    }

    fn add(&mut self, method: &str, pattern: &str, handler: T) -> Result<(), RouterError> {
        let Some(registry) = self.registry.get_mut().as_mut() else {
            warn!(method, pattern, "route added after the matcher was built");
            return Err(RouterError::Frozen);
        };

        let path = if pattern == "/*" { "*" } else { pattern };
        let index = self.handlers.len();

        if let Some(route) = registry
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            route.handlers.push(index);
        } else {
            let hint = analyze(path)?;
            registry.methods.insert(method.to_string());
            registry.routes.push(Route::new(method, path, hint, index));
        }

        self.handlers.push(handler);
        trace!(method, path, index, "route registered");
        Ok(())
    }

    fn match_path<'a>(
        &'a self,
        method: &str,
        path: &'a str,
    ) -> Result<Option<RouteMatch<'a, T>>, RouterError> {
        let compiled = self.compiled()?;
        Ok(self.lookup(compiled, method, path))
    }
}

fn build_all(registry: Registry, config: &RouterConfig) -> Result<Compiled, RouterError> {
    let catch_all = config.catch_all_method.as_str();
    let mut methods = HashMap::with_capacity(registry.methods.len() + 1);

    let targets = registry
        .methods
        .iter()
        .map(String::as_str)
        .filter(|m| !config.is_catch_all(m))
        .chain(std::iter::once(catch_all));

    for method in targets {
        let mut routes: Vec<Route> = registry
            .routes
            .iter()
            .filter(|r| r.method == method || r.method == catch_all)
            .cloned()
            .collect();
        resolve(&mut routes)?;
        let matchers = compile(method, &routes, config)?;
        methods.insert(method.to_string(), matchers);
    }

    debug!(
        routes = registry.routes.len(),
        methods = methods.len(),
        "router built"
    );
    Ok(Compiled { methods })
}
