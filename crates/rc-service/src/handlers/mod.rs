//! HTTP request handlers.

mod health;
mod metrics;
mod recordings;
mod token;
mod webhook;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use recordings::{
    delete_recording, get_recording, list_recordings, start_recording, stop_recording,
};
pub use token::create_token;
pub use webhook::receive_webhook;
