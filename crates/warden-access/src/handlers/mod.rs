//! Collaborator implementations that need no network
//!
//! - `memory`: handlers backed by in-process maps, with failure injection
//! - `fixture`: TOML-described worlds that populate the memory handlers

pub mod fixture;
pub mod memory;

pub use fixture::{FixtureChain, FixtureCredential, FixtureHandlers, FixtureStream, FixtureWorld};
pub use memory::{MemoryChainDiscovery, MemoryCredentialRegistry, MemoryStreamIndex};
