//! Init and config commands.

use anyhow::Result;
use cerberus_core::Settings;
use std::path::PathBuf;

pub fn run_init(force: bool) -> Result<()> {
    let path = PathBuf::from(".cerberus/settings.toml");
    if path.exists() && !force {
        anyhow::bail!("configuration file already exists at {} (use --force to overwrite)", path.display());
    }
    let settings = Settings::default();
    settings.save(&path)?;
    println!("Created configuration file at: {}", path.display());
    Ok(())
}

pub fn run_config(settings: &Settings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
    } else {
        println!("{}", toml::to_string_pretty(settings)?);
    }
    Ok(())
}
