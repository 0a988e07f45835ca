//! Configuration for cache-mutex.
//!
//! A YAML file selects the backend and the protocol defaults used by the CLI.
//! Parsing is forward compatible (unknown fields are ignored) and every field
//! has a default, so an empty file is a valid configuration.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use operations::CONFIG_ENV;
pub use types::Backend;
