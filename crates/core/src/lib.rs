//! Shared types, configuration, and errors for the policy service.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{PolicyError, PolicyResult};
