//! Process-wide defaults for building and matching, read from TOML.
//!
//! The embedded `default_settings.toml` applies unless a host installs its own
//! file with [`init_custom`] before anything calls [`settings`]. Library entry
//! points never consult this module on their own; callers turn it into
//! [`BuildOptions`](crate::BuildOptions) / [`MatchOptions`](crate::MatchOptions)
//! with their `from_settings` constructors.

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Upper bound for `matching.short_match_boundary`.
const MAX_SHORT_MATCH_BOUNDARY: usize = 16;

static INSTALLED: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("settings are already in use")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub build: BuildSettings,
    pub matching: MatchingSettings,
    pub loader: LoaderSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
    pub strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    pub short_match_boundary: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderSettings {
    pub verify_checksum: bool,
}

/// Install custom settings. Fails once [`settings`] has been read or another
/// file was installed.
pub fn init_custom(toml_content: &str) -> Result<(), SettingsError> {
    let custom = parse_settings_toml(toml_content)?;
    INSTALLED
        .set(custom)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Installed settings, falling back to the embedded defaults on first use.
pub fn settings() -> &'static Settings {
    INSTALLED.get_or_init(|| {
        parse_settings_toml(DEFAULT_SETTINGS_TOML)
            .expect("embedded default settings are checked by build.rs")
    })
}

pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let parsed: Settings = toml::from_str(toml_str)?;
    if parsed.matching.short_match_boundary > MAX_SHORT_MATCH_BOUNDARY {
        return Err(SettingsError::InvalidValue {
            field: "matching.short_match_boundary",
            reason: format!("must be at most {MAX_SHORT_MATCH_BOUNDARY}"),
        });
    }
    Ok(parsed)
}
