//! Configuration resolution for PV en Ligne.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/pvligne/settings.json)
//! 3. Project config (.pvligne/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binaries)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Complete PV en Ligne configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub autocomplete: AutocompleteConfig,
    #[serde(default)]
    pub panel: PanelConfig,
}

/// Where and how to reach the user-search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LookupConfig {
    pub base_url: String,
    pub search_path: String,
    pub query_param: String,
    /// Value of the `sessionid` cookie; the endpoint requires a logged-in user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    pub timeout_ms: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            search_path: "/api/users/search/".to_string(),
            query_param: "q".to_string(),
            session_cookie: None,
            timeout_ms: 5_000,
        }
    }
}

impl LookupConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Timing of the autocomplete behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutocompleteConfig {
    /// Idle time after the last keystroke before a lookup is issued.
    pub debounce_ms: u64,
    /// Delay between the host losing focus and the panel closing.
    pub blur_grace_ms: u64,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            blur_grace_ms: 150,
        }
    }
}

impl AutocompleteConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}

/// Suggestion panel geometry, in terminal cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PanelConfig {
    pub min_width: u16,
    /// Rows left empty between the caret line and the panel.
    pub margin: u16,
    /// Rows shown before the list scrolls.
    pub max_rows: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            min_width: 24,
            margin: 0,
            max_rows: 6,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut layers = Vec::new();
    if let Some(global_path) = global_config_path() {
        layers.push(global_path);
    }
    if let Some(dir) = project_dir {
        layers.push(dir.join(".pvligne").join("settings.json"));
    }

    let mut config = load_layers(&layers)?;
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Merge the settings files in `paths`, later ones winning key by key.
///
/// Missing files are skipped. A key absent from every file keeps its default.
pub fn load_layers(paths: &[PathBuf]) -> Result<Config> {
    let mut merged = serde_json::Value::Object(serde_json::Map::new());
    for path in paths.iter().filter(|p| p.exists()) {
        merge_value(&mut merged, read_settings(path)?);
    }
    serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".pvligne").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/pvligne/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("pvligne").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn read_settings(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "Config file {} must hold a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// Read a single settings file.
pub fn load_config_file(path: &Path) -> Result<Config> {
    serde_json::from_value(read_settings(path)?).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Deep-merge `overlay` into `base`: objects merge per key, anything else replaces.
fn merge_value(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply_env_overrides(config: &mut Config) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply `PVLIGNE_*` overrides from an arbitrary variable source.
pub fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("PVLIGNE_BASE_URL") {
        config.lookup.base_url = val;
    }
    if let Some(val) = var("PVLIGNE_SESSION") {
        config.lookup.session_cookie = Some(val);
    }
    if let Some(val) = var("PVLIGNE_DEBOUNCE_MS") {
        if let Ok(n) = val.parse() {
            config.autocomplete.debounce_ms = n;
        }
    }
}
