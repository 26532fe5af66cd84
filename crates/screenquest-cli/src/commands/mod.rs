pub mod assistant;
pub mod config;
pub mod replay;
pub mod rewards;

use screenquest_core::Config;
use std::path::Path;

/// Load the config from `path` when given, otherwise from the default
/// location.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
