//! CLI configuration: command-line overrides on top of the settings files.

use std::path::{Path, PathBuf};

use pvligne_core::Config;

/// Values given on the command line. They win over files and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub session_cookie: Option<String>,
    pub debounce_ms: Option<u64>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.lookup.base_url.clone_from(url);
        }
        if let Some(cookie) = &self.session_cookie {
            config.lookup.session_cookie = Some(cookie.clone());
        }
        if let Some(ms) = self.debounce_ms {
            config.autocomplete.debounce_ms = ms;
        }
    }
}

/// Settings files, environment, then command line.
pub fn resolve(project_dir: Option<&Path>, overrides: &CliOverrides) -> anyhow::Result<Config> {
    let mut config = pvligne_core::config::load_config(project_dir)?;
    overrides.apply(&mut config);
    Ok(config)
}

/// Where the TUI logs when no `--log-file` is given: `<data dir>/pvligne/pvligne.log`.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("pvligne").join("pvligne.log"))
}
