//! Configuration management for Hermes
//!
//! Provides persistent settings storage with schema versioning and
//! migrations. Configuration is stored in `~/.hermes/config.json` and
//! cached in memory for the process lifetime.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Global config instance for caching
static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations
    pub version: u32,
    /// Call display and queue settings
    pub calls: CallConfig,
    /// Error overlay settings
    pub overlay: OverlayConfig,
    /// General application settings
    pub general: GeneralConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            calls: CallConfig::default(),
            overlay: OverlayConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

/// Call display and queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    /// Blink interval for pending/urgent call entries, in milliseconds
    pub blink_interval_ms: u64,
    /// Number of answer-key slots shown in the queue
    pub answer_key_slots: usize,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            blink_interval_ms: 500,
            answer_key_slots: 5,
        }
    }
}

/// Error overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Auto-dismiss delay applied to non-critical errors without their own
    /// timeout, in milliseconds (0 = keep until closed)
    pub non_critical_timeout_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            non_critical_timeout_ms: 5000,
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Keep the console window above other windows
    pub always_on_top: bool,
    /// Automatically check for updates on launch
    pub check_for_updates: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            always_on_top: false,
            check_for_updates: true,
        }
    }
}

/// Get the path to the config file (~/.hermes/config.json)
pub fn get_config_path() -> PathBuf {
    home_dir_or_fallback().join(".hermes").join("config.json")
}

/// Get the path to the config directory (~/.hermes)
fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".hermes")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Ensure the config directory exists
fn ensure_config_dir() -> Result<(), String> {
    let dir = get_config_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    Ok(())
}

/// Load configuration from disk
fn load_from_disk() -> Result<Config, String> {
    let path = get_config_path();

    if !path.exists() {
        tracing::info!("Config file not found, using defaults");
        return Ok(Config::default());
    }

    let contents =
        fs::read_to_string(&path).map_err(|e| format!("Failed to read config file: {}", e))?;

    let config: Config =
        serde_json::from_str(&contents).map_err(|e| format!("Failed to parse config: {}", e))?;

    // Run migrations if needed, persisting the migrated schema
    let original_version = config.version;
    let migrated = migrate_config(config)?;
    if migrated.version != original_version {
        save_to_disk(&migrated)?;
    }

    Ok(migrated)
}

/// Save configuration to disk
fn save_to_disk(config: &Config) -> Result<(), String> {
    ensure_config_dir()?;

    let path = get_config_path();
    let contents = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialise config: {}", e))?;

    fs::write(&path, contents).map_err(|e| format!("Failed to write config file: {}", e))?;

    tracing::info!("Config saved to disk");
    Ok(())
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, String> {
    let original_version = config.version;

    // Apply migrations sequentially
    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version != original_version {
        tracing::info!(
            "Migrated config from version {} to {}",
            original_version,
            config.version
        );
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, String> {
    match config.version {
        // Version 0 -> 1: Initial migration (add any new fields)
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            // Future migrations would add field transformations here
            Ok(migrated)
        }
        v => Err(format!("Unknown config version: {}", v)),
    }
}

/// Get the global config instance
fn get_config_instance() -> &'static RwLock<Config> {
    CONFIG.get_or_init(|| {
        let config = load_from_disk().unwrap_or_else(|e| {
            tracing::error!("Failed to load config, using defaults: {}", e);
            Config::default()
        });
        tracing::info!("Config loaded from disk");
        RwLock::new(config)
    })
}

/// Get the current configuration
///
/// The config is cached in memory and loaded from disk on first access.
pub fn get_config() -> Config {
    get_config_instance().read().clone()
}

/// Update the configuration
///
/// Replaces the current configuration with the provided config and persists
/// it to disk. The version field is automatically updated to the current
/// schema.
pub fn set_config(mut config: Config) -> Result<(), String> {
    // Ensure version is current
    config.version = CURRENT_VERSION;

    // Save to disk first
    save_to_disk(&config)?;

    // Update cached config
    let mut cached = get_config_instance().write();
    *cached = config;

    tracing::info!("Configuration updated");
    Ok(())
}

/// Reset configuration to defaults
///
/// Resets all settings to their default values and persists to disk.
pub fn reset_config() -> Result<Config, String> {
    let default_config = Config::default();

    // Save to disk
    save_to_disk(&default_config)?;

    // Update cached config
    let mut cached = get_config_instance().write();
    *cached = default_config.clone();

    tracing::info!("Configuration reset to defaults");
    Ok(default_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_current_version() {
        let config = Config::default();
        assert_eq!(config.version, CURRENT_VERSION);
    }

    #[test]
    fn test_config_serialisation_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialised: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialised.version, config.version);
        assert_eq!(
            deserialised.calls.blink_interval_ms,
            config.calls.blink_interval_ms
        );
        assert_eq!(
            deserialised.overlay.non_critical_timeout_ms,
            config.overlay.non_critical_timeout_ms
        );
    }

    #[test]
    fn test_call_config_defaults() {
        let calls = CallConfig::default();
        assert_eq!(calls.blink_interval_ms, 500);
        assert_eq!(calls.answer_key_slots, 5);
    }

    #[test]
    fn test_overlay_config_defaults() {
        let overlay = OverlayConfig::default();
        assert_eq!(overlay.non_critical_timeout_ms, 5000);
    }

    #[test]
    fn test_general_config_defaults() {
        let general = GeneralConfig::default();
        assert!(!general.always_on_top);
        assert!(general.check_for_updates);
    }

    #[test]
    fn test_partial_config_deserialisation() {
        // Config should use defaults for missing fields
        let json = r#"{"version": 1, "calls": {"blink_interval_ms": 250}}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.calls.blink_interval_ms, 250);
        assert_eq!(config.calls.answer_key_slots, 5); // Default
        assert_eq!(config.overlay.non_critical_timeout_ms, 5000); // Default
    }

    #[test]
    fn test_migration_from_version_0() {
        let old_config = Config {
            version: 0,
            ..Default::default()
        };

        let migrated = migrate_config(old_config).unwrap();
        assert_eq!(migrated.version, CURRENT_VERSION);
    }

    #[test]
    fn test_apply_migration_unknown_version() {
        let future_config = Config {
            version: 999,
            ..Default::default()
        };

        let result = apply_migration(future_config);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown config version"));
    }

    #[test]
    fn test_config_path_format() {
        let path = get_config_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains(".hermes"));
        assert!(path_str.ends_with("config.json"));
    }

    #[test]
    fn test_config_unknown_fields_ignored() {
        // JSON with extra unknown fields should still parse
        let json = r#"{
            "version": 1,
            "unknown_field": "should be ignored",
            "calls": {"blink_interval_ms": 500, "extra": true}
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.calls.blink_interval_ms, 500);
    }
}
