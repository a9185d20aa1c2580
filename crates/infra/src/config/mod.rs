//! Configuration loading
//!
//! Layers defaults, an optional file and environment overrides into
//! validated [`Settings`](altoro_domain::Settings).

pub mod loader;

pub use loader::{
    apply_env_overrides, discover_config_path, load, load_from_file, load_with, ENV_PREFIX,
};
