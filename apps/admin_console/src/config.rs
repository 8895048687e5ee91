use std::{
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::{view_model::ViewModelConfig, Session};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "admin.toml";

pub struct Settings {
    pub api_base: String,
    pub page_size: u32,
    pub notice_ttl_ms: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub login: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8081".into(),
            page_size: 100,
            notice_ttl_ms: 3_000,
            request_timeout_secs: 30,
            log_level: "info".into(),
            login: None,
            password: None,
            token: None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_base", &self.api_base)
            .field("page_size", &self.page_size)
            .field("notice_ttl_ms", &self.notice_ttl_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .field("login", &self.login)
            .field("password_present", &self.password.is_some())
            .field("token_present", &self.token.is_some())
            .finish()
    }
}

impl Settings {
    pub fn view_model_config(&self) -> ViewModelConfig {
        ViewModelConfig {
            page_size: self.page_size,
            notice_ttl: Duration::from_millis(self.notice_ttl_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// A precomputed token wins over a login/password pair.
    pub fn session(&self) -> anyhow::Result<Session> {
        let session = match (&self.token, &self.login, &self.password) {
            (Some(token), _, _) => Session::new(&self.api_base, token.clone()),
            (None, Some(login), Some(password)) => {
                Session::from_login(&self.api_base, login, password)
            }
            _ => bail!(
                "no credentials configured; set APP__TOKEN or APP__LOGIN and APP__PASSWORD"
            ),
        };
        session.with_context(|| format!("failed to open session for '{}'", self.api_base))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
    page_size: Option<u32>,
    notice_ttl_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    log_level: Option<String>,
    login: Option<String>,
    password: Option<String>,
    token: Option<String>,
}

/// Defaults, then the TOML file, then `APP__*` environment variables.
/// A missing default file is fine; a missing explicit file is not.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound && config_path.is_none() => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file.api_base {
        settings.api_base = v;
    }
    if let Some(v) = file.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file.notice_ttl_ms {
        settings.notice_ttl_ms = v;
    }
    if let Some(v) = file.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file.log_level {
        settings.log_level = v;
    }
    if file.login.is_some() {
        settings.login = file.login;
    }
    if file.password.is_some() {
        settings.password = file.password;
    }
    if file.token.is_some() {
        settings.token = file.token;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = lookup("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = lookup("APP__PAGE_SIZE").and_then(|v| v.parse().ok()) {
        settings.page_size = v;
    }
    if let Some(v) = lookup("APP__NOTICE_TTL_MS").and_then(|v| v.parse().ok()) {
        settings.notice_ttl_ms = v;
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }

    if let Some(v) = lookup("APP__LOG_LEVEL") {
        settings.log_level = v;
    }
    if let Some(v) = lookup("APP__LOGIN") {
        settings.login = Some(v);
    }
    if let Some(v) = lookup("APP__PASSWORD") {
        settings.password = Some(v);
    }
    if let Some(v) = lookup("APP__TOKEN") {
        settings.token = Some(v);
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
