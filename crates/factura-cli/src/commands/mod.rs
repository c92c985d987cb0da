//! CLI subcommands.

pub mod config;
pub mod process;
pub mod records;
pub mod serve;

use std::path::{Path, PathBuf};

use tracing::debug;

use factura_core::FacturaConfig;

/// Default configuration file location: `<config dir>/factura/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factura")
        .join("config.json")
}

/// Resolve the configuration file in use: the `--config` path if given,
/// otherwise the default location.
pub fn config_path(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the file configuration without environment overrides.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_file_config(explicit: Option<&str>) -> anyhow::Result<FacturaConfig> {
    let path = config_path(explicit);

    if explicit.is_some() || path.exists() {
        debug!("loading config from {}", path.display());
        Ok(FacturaConfig::from_file(Path::new(&path))?)
    } else {
        Ok(FacturaConfig::default())
    }
}

/// Load the effective configuration: file settings plus environment overrides.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<FacturaConfig> {
    let mut config = load_file_config(explicit)?;
    config.apply_env();
    Ok(config)
}
