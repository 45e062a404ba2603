//! Long-running service pieces: storage, HTTP surface, metrics and paths.

pub mod http;
pub mod metrics;
pub mod paths;
pub mod services;
