use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use client_core::DEFAULT_API_URL;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "activities.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
    pub token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout_secs: None,
            log_filter: "info".into(),
            token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
    token: Option<String>,
}

/// Defaults, then the config file, then the environment. A missing default
/// file is fine; a missing file that was asked for explicitly is not.
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if config_path.is_some() => {
            return Err(err).with_context(|| format!("cannot read '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = normalize_api_url(&v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.token {
        settings.token = Some(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("ACTIVITIES_API_URL") {
        settings.api_url = normalize_api_url(&v);
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = normalize_api_url(&v);
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = var("APP__TOKEN") {
        if !v.trim().is_empty() {
            settings.token = Some(v.trim().to_string());
        }
    }
}

pub fn normalize_api_url(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('/');
    if raw.is_empty() {
        return Settings::default().api_url;
    }
    if raw.contains("://") {
        return raw.to_string();
    }
    format!("http://{raw}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
