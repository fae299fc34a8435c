//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/proftree/proftree.toml`
//! 3. Explicit config file (`--config <file>`)
//! 4. Environment variables: `PROFTREE_*` prefix, `__` as section separator

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{KeyPolicy, MatchOptions};

/// Evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatchingConfig {
    /// Compare literals case-sensitively (default: true)
    pub case_sensitive: bool,
    /// Evidence key for nodes without their own key: "inherit" or "explicit"
    pub key_policy: KeyPolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let defaults = MatchOptions::default();
        Self {
            case_sensitive: defaults.case_sensitive,
            key_policy: defaults.key_policy,
        }
    }
}

impl From<&MatchingConfig> for MatchOptions {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            case_sensitive: config.case_sensitive,
            key_policy: config.key_policy,
        }
    }
}

/// Raw matching config for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawMatchingConfig {
    pub case_sensitive: Option<bool>,
    pub key_policy: Option<KeyPolicy>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub matching: RawMatchingConfig,
}

/// Unified configuration for proftree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Default tree data file used when a command gets no `--data`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// Evaluation settings
    pub matching: MatchingConfig,
}

/// Get the XDG config directory for proftree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "proftree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("proftree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Tree data file after `~` and `$VAR` expansion.
    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions::from(&self.matching)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.data_file {
            let raw = path.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.data_file = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay.data_file.clone().or_else(|| self.data_file.clone()),
            matching: MatchingConfig {
                case_sensitive: overlay
                    .matching
                    .case_sensitive
                    .unwrap_or(self.matching.case_sensitive),
                key_policy: overlay.matching.key_policy.unwrap_or(self.matching.key_policy),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; must exist when given
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit config file
        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply PROFTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PROFTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = Some(PathBuf::from(val));
        }
        match config.get_bool("matching.case_sensitive") {
            Ok(val) => settings.matching.case_sensitive = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }
        if let Ok(val) = config.get_string("matching.key_policy") {
            settings.matching.key_policy = parse_key_policy(&val)?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# proftree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/proftree/proftree.toml
#   File:   --config <file>
#   Env:    PROFTREE_* environment variables, e.g. PROFTREE_MATCHING__KEY_POLICY=explicit

# Tree data file used when no --data is given
# data_file = "~/.local/share/proftree/tree.json"

[matching]
# Compare literal values case-sensitively
# case_sensitive = true

# Evidence key for nodes that do not name one:
#   "inherit"  - use the nearest ancestor's key
#   "explicit" - skip the node
# key_policy = "inherit"
"#
        .to_string()
    }
}

fn parse_key_policy(raw: &str) -> Result<KeyPolicy, ApplicationError> {
    match raw.trim().to_lowercase().as_str() {
        "inherit" => Ok(KeyPolicy::Inherit),
        "explicit" => Ok(KeyPolicy::Explicit),
        other => Err(ApplicationError::Config {
            message: format!("invalid key_policy '{other}', expected 'inherit' or 'explicit'"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_converting_then_match_options_are_default() {
        let settings = Settings::default();
        assert_eq!(settings.match_options(), MatchOptions::default());
        assert!(settings.data_file().is_none());
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_keep_base() {
        let base = Settings {
            data_file: Some(PathBuf::from("/data/tree.json")),
            matching: MatchingConfig::default(),
        };
        let overlay: RawSettings = toml::from_str("[matching]\nkey_policy = \"explicit\"\n").unwrap();

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.data_file, Some(PathBuf::from("/data/tree.json")));
        assert_eq!(merged.matching.key_policy, KeyPolicy::Explicit);
        assert!(merged.matching.case_sensitive);
    }

    #[test]
    fn given_tilde_in_data_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_file: Some(PathBuf::from("~/tree.json")),
            matching: MatchingConfig::default(),
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let path = settings.data_file.unwrap();
        assert!(path.starts_with(&home), "{}", path.display());
    }

    #[test]
    fn given_key_policy_strings_when_parsing_then_accepts_known_values() {
        assert_eq!(parse_key_policy("Inherit").unwrap(), KeyPolicy::Inherit);
        assert_eq!(parse_key_policy(" explicit ").unwrap(), KeyPolicy::Explicit);
        assert!(parse_key_policy("sometimes").is_err());
    }

    #[test]
    fn given_default_settings_when_serialized_then_shows_matching_section() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        assert!(text.contains("key_policy = \"inherit\""));
        assert!(text.contains("case_sensitive = true"));
    }
}
