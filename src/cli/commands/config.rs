//! Configuration inspection.

use std::path::Path;

use crate::config::{self, Config};

/// Print the effective configuration and where it is read from
pub fn cmd_config(effective: &Config, explicit: Option<&Path>, save: bool) -> anyhow::Result<()> {
    let path = explicit.map(Path::to_path_buf).or_else(config::config_path);

    match &path {
        Some(p) if p.exists() => println!("# Config file: {}", p.display()),
        Some(p) => println!("# Config file: {} (not found, showing defaults)", p.display()),
        None => println!("# No config directory on this system, showing defaults"),
    }
    println!();
    println!("{}", toml::to_string_pretty(effective)?);

    if save {
        match &path {
            Some(p) => {
                config::save_to(effective, p)?;
                println!("✓ Saved to {}", p.display());
            }
            None => return Err(config::ConfigError::NoConfigDir.into()),
        }
    }
    Ok(())
}
