//! Shared building blocks for the database admin service.
//!
//! Holds everything that is not tied to a particular controller:
//! configuration, the error type, the response envelope, middleware,
//! data models and the SQL/HTML string utilities.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
