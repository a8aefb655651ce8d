//! Account client library: the orchestrator, its ports, and HTTP adapters.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(feature = "test-support")]
pub mod test_support;
