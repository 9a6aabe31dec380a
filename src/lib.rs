// Public API for integration tests and potential library usage

pub mod api;
pub mod progress;
pub mod queue;
pub mod source;
pub mod state;
pub mod types;
