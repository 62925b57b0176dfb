//! Daily museum-artwork poster: keeps a queue of rendered posts topped up
//! from a collection search API and publishes one per run, never posting the
//! same artwork twice.

pub mod config;
pub mod generator;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod publisher;
pub mod replenish;
pub mod retry;
pub mod source;
pub mod store;
pub mod terms;
