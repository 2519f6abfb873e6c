//! Configuration management for formkit using Figment
//!
//! ```no_run
//! let config = formkit_config::load().unwrap();
//! println!("custom fields live in {}", config.store.directory.display());
//! ```

pub mod config;
pub mod discovery;
pub mod error;

pub use config::{
    load, ConfigLoader, FormConfig, StoreConfig, DEFAULT_CUSTOM_PREFIX, ENV_PREFIX, ENV_SPLIT,
};
pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery, CONFIG_DIR_NAME};
pub use error::ConfigError;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
