use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::dispatch::normalize_host;
use crate::domain::Credentials;
use crate::error::CidError;
use crate::formats::FormatTable;
use crate::workspace::Workspace;

pub const DEFAULT_CONFIG_FILE: &str = "cid.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub host: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub workspace: Option<Utf8PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub host: String,
    pub username: String,
    pub password: Option<String>,
    pub workspace: Workspace,
    pub timeout: Duration,
    pub formats: FormatTable,
}

impl ResolvedConfig {
    pub fn credentials(&self, fallback: Option<String>) -> Result<Credentials, CidError> {
        let password = self
            .password
            .clone()
            .or(fallback)
            .ok_or_else(|| CidError::ConfigParse("no password configured".to_string()))?;
        Ok(Credentials::new(&self.host, &self.username, password))
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CidError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(CidError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CidError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CidError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CidError> {
        let host = normalize_host(&config.host);
        if host.is_empty() {
            return Err(CidError::ConfigParse("host must not be empty".to_string()));
        }
        let username = config.username.trim().to_string();
        if username.is_empty() {
            return Err(CidError::ConfigParse(
                "username must not be empty".to_string(),
            ));
        }

        let workspace = match config.workspace {
            Some(root) => Workspace::new_with_root(root),
            None => Workspace::new()?,
        };

        let mut formats = FormatTable::with_builtins();
        for (format, extension) in &config.formats {
            formats.insert(format, extension);
        }

        Ok(ResolvedConfig {
            host,
            username,
            password: config.password,
            workspace,
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            formats,
        })
    }
}
