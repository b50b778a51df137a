//! Configuration for steamroller.
//!
//! The resource map comes from an optional YAML file with a `resource_map`
//! key, followed by `root=dir` overrides from the command line.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
