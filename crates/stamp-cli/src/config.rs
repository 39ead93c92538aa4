//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use stamp_core::{Settings, StampConfig};

/// Application configuration: the settings plus the file they persist to.
#[derive(Clone, Default)]
pub struct Config {
    pub settings: Settings,
    /// File that `stamp toggle` writes back to.
    pub file: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("settings", &self.settings)
            .field("file", &self.file)
            .finish()
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Layers, lowest precedence first: built-in defaults, the platform
    /// config file, `config_path`, then `STAMP_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        let default_file = dirs_config_path().map(|dir| dir.join("config.toml"));
        if let Some(path) = &default_file {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("STAMP_"));

        let settings: Settings = figment.extract()?;
        Ok(Self {
            settings,
            file: config_path.map(Path::to_path_buf).or(default_file),
        })
    }

    /// Validated snapshot for the engine.
    pub fn stamp_config(&self) -> StampConfig {
        StampConfig::from_settings(&self.settings)
    }

    /// Writes `auto_stamp` into the config file.
    ///
    /// Every other key in the file is kept as it is. Values that came from
    /// defaults, another file or the environment are not written.
    pub fn persist_auto_stamp(&self) -> anyhow::Result<()> {
        let path = self
            .file
            .as_deref()
            .context("could not determine config file location")?;

        let mut table = match std::fs::read_to_string(path) {
            Ok(text) => text
                .parse::<toml::Table>()
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        table.insert(
            "auto_stamp".to_string(),
            toml::Value::Boolean(self.settings.auto_stamp),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create config directory")?;
        }
        let toml = toml::to_string_pretty(&table).context("failed to serialize settings")?;
        std::fs::write(path, toml)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Returns the platform-specific config directory for stamp.
///
/// On Linux: `~/.config/stamp`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stamp"))
}
