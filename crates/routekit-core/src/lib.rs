//! Core types shared by the routekit routers.
//!
//! This crate provides the contract every routing engine implements:
//! - [`Router`] trait for registration and lookup
//! - [`RouteMatch`] carrying ordered handlers and extracted parameters
//! - [`RouterError`] for declaration mistakes
//! - [`RouterConfig`] for engine configuration
//!
//! # Design Principles
//!
//! - Routes are written once, then frozen
//! - A lookup that finds nothing is `Ok(None)`, never an error
//! - Match results borrow from the router and the request path

#![forbid(unsafe_code)]

mod config;
mod error;
mod r#match;
mod router;

pub use config::{DEFAULT_REGEX_SIZE_LIMIT, METHOD_NAME_ALL, RouterConfig};
pub use error::RouterError;
pub use r#match::RouteMatch;
pub use router::Router;
