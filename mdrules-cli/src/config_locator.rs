//! Config Locator - find the formatter configuration for a CLI run
//!
//! Lookup order:
//! 1. `--config <path>` given on the command line
//! 2. `$MDRULES_CONFIG_DIR/config.yaml`
//! 3. `<user config dir>/mdrules/config.yaml` (e.g. ~/.config/mdrules on Linux)
//! 4. built-in defaults

use anyhow::{Context, Result};
use mdrules_core::FormatterConfig;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable that overrides the user config directory
pub const CONFIG_DIR_ENV: &str = "MDRULES_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Where a run's configuration came from, for status output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    /// A discovered file existed but couldn't be loaded
    Fallback(PathBuf),
    Defaults,
}

/// Directory holding the user's mdrules config, if one can be determined
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::config_dir().map(|base| base.join("mdrules"))
}

/// Path of the discovered config file, only if it exists
pub fn discover_config_file() -> Option<PathBuf> {
    config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

/// Resolve the configuration for this run.
///
/// An explicit path that can't be read or parsed is an error. A discovered
/// file that fails to load falls back to defaults with a logged warning.
pub fn resolve(explicit: Option<&Path>) -> Result<(FormatterConfig, ConfigSource)> {
    resolve_with(explicit, discover_config_file())
}

fn resolve_with(
    explicit: Option<&Path>,
    discovered: Option<PathBuf>,
) -> Result<(FormatterConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = FormatterConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    let Some(path) = discovered else {
        return Ok((FormatterConfig::default(), ConfigSource::Defaults));
    };
    match FormatterConfig::load_from_file(&path) {
        Ok(config) => Ok((config, ConfigSource::Discovered(path))),
        Err(e) => {
            warn!("failed to load {}, using defaults: {e:#}", path.display());
            Ok((FormatterConfig::default(), ConfigSource::Fallback(path)))
        }
    }
}
