//! REST layer for the policy service: request validation, handler wiring,
//! and server bootstrap.

pub mod rest;
pub mod server;

pub use server::ApiServer;
