//! Path routers for routekit.
//!
//! Two engines implement the [`Router`] contract:
//!
//! - [`RegExpRouter`] resolves route relations once and compiles every
//!   method into a single anchored regular expression
//! - [`TrieRouter`] walks a segment trie at lookup time
//!
//! # Features
//!
//! - Named parameters (`/user/:id`) with optional constraints
//!   (`/user/:id{[0-9]+}`)
//! - Trailing and inner wildcards (`/assets/*`) and the catch-all `*`
//! - Less specific routes run as middleware of the routes they cover
//! - Per-method routes with a catch-all method fallback

#![forbid(unsafe_code)]

mod compiler;
mod pattern;
mod regexp;
mod relation;
mod trie;

pub use regexp::RegExpRouter;
pub use routekit_core::{
    DEFAULT_REGEX_SIZE_LIMIT, METHOD_NAME_ALL, RouteMatch, Router, RouterConfig, RouterError,
};
pub use trie::{PathScorer, ScoreComparator, TrieRouter};
