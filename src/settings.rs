//! Demo settings with persistence
//!
//! Settings are read from `<config_dir>/nomad/settings.toml`. A missing file means
//! defaults, a broken one is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;

use nomad_ecs::EcsConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All demo settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ecs: EcsConfig,
    pub demo: DemoSettings,
}

impl Settings {
    /// `<config_dir>/nomad/settings.toml`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nomad").join("settings.toml"))
    }

    /// Load from [`Settings::default_path`]. With no config directory the defaults apply.
    pub fn load() -> anyhow::Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("no config directory on this platform, using default settings");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate the settings file at `path`.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be read, parsed
    /// or validated is an error, so a bad ECS configuration stops the run.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        let settings = Self::from_toml_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        settings
            .ecs
            .validate()
            .with_context(|| format!("invalid [ecs] section in {}", path.display()))?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse settings from TOML text. Missing keys fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Parameters of the demo run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Number of entities spawned before the first tick
    pub entities: usize,
    /// Number of update/render ticks to run
    pub ticks: u32,
    /// Fixed delta time per tick, in seconds
    pub delta: f32,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            entities: 16,
            ticks: 60,
            delta: 1.0 / 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn partial_override() {
        let settings = Settings::from_toml_str(
            r#"
            [ecs]
            max_components_per_type = 8

            [demo]
            ticks = 3
            "#,
        )
        .unwrap();
        assert_eq!(settings.ecs.max_components_per_type, 8);
        assert_eq!(settings.ecs.max_component_families, 64);
        assert_eq!(settings.demo.ticks, 3);
        assert_eq!(settings.demo.entities, 16);
    }

    fn temp_settings_path(tag: &str) -> PathBuf {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("nomad_settings_{tag}_{id}.toml"))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = temp_settings_path("missing");
        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn load_from_reads_file() {
        let path = temp_settings_path("reads");
        fs::write(&path, "[demo]\nentities = 4\n").unwrap();
        let settings = Settings::load_from(&path);
        fs::remove_file(&path).ok();
        assert_eq!(settings.unwrap().demo.entities, 4);
    }

    #[test]
    fn load_from_rejects_bad_file() {
        let path = temp_settings_path("bad");
        fs::write(&path, "[ecs]\nmax_components_per_type = 0\n").unwrap();
        let invalid = Settings::load_from(&path);
        fs::write(&path, "[ecs\n").unwrap();
        let malformed = Settings::load_from(&path);
        fs::remove_file(&path).ok();

        let err = invalid.unwrap_err();
        assert!(err.to_string().contains("invalid [ecs] section"));
        assert!(matches!(
            err.downcast_ref::<nomad_ecs::EcsError>(),
            Some(nomad_ecs::EcsError::InvalidConfig(_))
        ));
        assert!(malformed.unwrap_err().to_string().starts_with("parsing"));
    }

    #[test]
    fn malformed_file_is_error() {
        assert!(Settings::from_toml_str("[ecs]\nmax_components_per_type = \"lots\"").is_err());
    }
}
