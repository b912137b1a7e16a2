//! Protocol registry, built-in dataset, and dataset loading.

mod builtin;
mod config;
mod registry;

pub use builtin::{builtin_entries, ids};
pub use config::{ConfigError, ProtocolConfig, CONFIG_PATH_ENV};
pub use registry::{ProtocolEntry, ProtocolRegistry, RegistryError};
