use crate::defaults::CONFIG_FILE_NAME;
use crate::io::Configuration;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Reads the configuration from `cdft.toml` in the working directory.
pub fn read_input() -> Result<Configuration> {
    read_config(Path::new(CONFIG_FILE_NAME))
}

pub fn read_config(config_file_path: &Path) -> Result<Configuration> {
    // Missing keys (or a missing file) fall back to the default settings.
    let config_string: String = if config_file_path.exists() {
        fs::read_to_string(config_file_path)
            .with_context(|| format!("Unable to read config file {}", config_file_path.display()))?
    } else {
        String::from("")
    };
    let config: Configuration = toml::from_str(&config_string)
        .with_context(|| format!("Unable to parse config file {}", config_file_path.display()))?;
    // The complete configuration is saved if the file does not exist so that the user
    // can see all the used options.
    if !config_file_path.exists() {
        let config_string: String =
            toml::to_string(&config).context("Unable to serialize the configuration")?;
        fs::write(config_file_path, config_string).with_context(|| {
            format!("Unable to write config file {}", config_file_path.display())
        })?;
    }
    Ok(config)
}
