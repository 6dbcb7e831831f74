//! Turbine site visit API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! service, middleware) so integration tests and the binary entrypoint can
//! both access them.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod router;
pub mod routes;
pub mod service;
pub mod state;
