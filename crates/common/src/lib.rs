//! Shared library for the Roomcast backend.
//!
//! # Modules
//!
//! - `jwt` - Room access token minting (HS256, LiveKit-compatible video grants)
//! - `webhook` - Webhook signature and body-digest verification
//! - `secret` - Secret types for sensitive values

pub mod jwt;
pub mod secret;
pub mod webhook;
