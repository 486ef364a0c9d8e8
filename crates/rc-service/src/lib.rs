//! Roomcast Recording Service Library
//!
//! Backend for the Roomcast conferencing demo: mints room access tokens,
//! receives media-server webhooks, starts and stops room recordings through
//! the egress API, and serves recording files from local disk with HTTP
//! range support.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `errors` - Error types and HTTP mappings
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Request/response types
//! - `observability` - Metrics definitions
//! - `routes` - Router and application state
//! - `services` - Egress client, recording tracker, recording storage

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
