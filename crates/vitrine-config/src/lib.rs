//! Configuration system for the Vitrine admin client.
//!
//! Provides TOML-based configuration with:
//! - The API base location (`[api] host`, or `VITRINE_API_HOST`)
//! - Standard outbound headers (client platform, locale)
//! - The identity-provider contract: endpoints, token pointers, lifetimes
//! - Session timers (periodic refresh, focus refresh, refresh timeout)
//! - Request cache policy
//!
//! Config file layering (XDG user config + project-local overrides +
//! environment) is handled by [`discovery`].

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
