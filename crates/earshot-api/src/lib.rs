//! Earshot API service.
//!
//! Exposed as a library so integration tests can build the router with
//! in-memory doubles.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod projection;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
