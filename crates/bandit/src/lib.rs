//! Thompson-sampling bandit core: state completion, arm selection, and
//! belief updates. Pure value-in/value-out over an injected RNG; persistence
//! and its concurrency control live in `policy-store`.

pub mod engine;
pub mod sampler;
pub mod state;
pub mod updater;

pub use engine::PolicyEngine;
