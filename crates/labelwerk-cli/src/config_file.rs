// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration file resolution.
//
// Precedence, lowest to highest: built-in defaults, `config.json` in the
// config directory, the `LABELWERK_URL` environment variable, command-line
// flags.

use std::path::{Path, PathBuf};

use labelwerk_core::config::ClientConfig;
use labelwerk_core::error::Result;
use tracing::debug;

pub const CONFIG_FILE: &str = "config.json";
pub const URL_ENV: &str = "LABELWERK_URL";

/// Overrides collected from the environment and the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub env_url: Option<String>,
    pub flag_url: Option<String>,
    pub flag_timeout: Option<u64>,
}

/// Return the configuration directory (not created until something is saved).
pub fn config_dir() -> PathBuf {
    dirs_fallback().join("labelwerk")
}

fn dirs_fallback() -> PathBuf {
    // $XDG_CONFIG_HOME wins; otherwise the conventional ~/.config.
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // No home directory at all, e.g. inside a bare container.
    PathBuf::from("/tmp")
}

/// Read `config.json` from `dir`.  A missing file is not an error.
pub fn load_config(dir: &Path) -> Result<Option<ClientConfig>> {
    let path = dir.join(CONFIG_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&data)?))
}

pub fn persist_config(dir: &Path, config: &ClientConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Layer file, environment and flags, then validate the result.
pub fn resolve(dir: &Path, overrides: Overrides) -> Result<ClientConfig> {
    let mut config = load_config(dir)?.unwrap_or_default();

    if let Some(url) = overrides.env_url.filter(|url| !url.trim().is_empty()) {
        config.base_url = url;
    }
    if let Some(url) = overrides.flag_url {
        config.base_url = url;
    }
    if let Some(timeout) = overrides.flag_timeout {
        config.timeout_secs = timeout;
    }

    config.validate()?;
    Ok(config)
}
