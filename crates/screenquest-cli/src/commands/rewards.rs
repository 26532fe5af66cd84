use std::path::Path;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config.rewards)?);
    Ok(())
}
