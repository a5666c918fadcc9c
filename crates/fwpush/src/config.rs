// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of fwpush.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz


//! Configuration loaded from a TOML file with environment fallbacks

use crate::authorization::PermissionIds;
use crate::error::{FwpushError, Result};
use crate::session::RolloutSettings;
use fwpush_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const ENV_API_URL: &str = "FWPUSH_API_URL";
pub const ENV_APPLICATION_ID: &str = "FWPUSH_APPLICATION_ID";
pub const ENV_TOKEN: &str = "FWPUSH_TOKEN";
pub const ENV_COMPANY_ID: &str = "FWPUSH_COMPANY_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub rollout: RolloutSettings,
    #[serde(default)]
    pub permissions: PermissionIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Delay after each request in milliseconds
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default)]
    pub max_pages: Option<u32>,
}

fn default_base_url() -> String {
    "https://portal.ixon.cloud/api/".to_string()
}

fn default_api_version() -> String {
    "2".to_string()
}

fn default_throttle_ms() -> u64 {
    200
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            application_id: String::new(),
            token: String::new(),
            company_id: None,
            api_version: default_api_version(),
            throttle_ms: default_throttle_ms(),
            max_pages: None,
        }
    }
}

impl AppConfig {
    /// Parse TOML content without consulting the environment.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FwpushError::Config(format!("failed to parse config TOML: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FwpushError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus whatever the environment provides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Fill settings the file left empty from `lookup`.
    ///
    /// A URL from the environment always wins over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            debug!("API URL taken from {ENV_API_URL}");
            self.api.base_url = url;
        }
        if self.api.application_id.is_empty()
            && let Some(id) = lookup(ENV_APPLICATION_ID)
        {
            self.api.application_id = id;
        }
        if self.api.token.is_empty()
            && let Some(token) = lookup(ENV_TOKEN)
        {
            self.api.token = token;
        }
        if self.api.company_id.is_none() {
            self.api.company_id = lookup(ENV_COMPANY_ID);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(FwpushError::Config("api.base_url must be set".into()));
        }
        if self.api.application_id.is_empty() {
            return Err(FwpushError::Config(format!(
                "api.application_id must be set (or {ENV_APPLICATION_ID})"
            )));
        }
        if self.api.token.is_empty() {
            return Err(FwpushError::Config(format!(
                "api.token must be set (or {ENV_TOKEN})"
            )));
        }
        if self.rollout.agent_types.is_empty() {
            return Err(FwpushError::Config(
                "rollout.agent_types must name at least one agent type".into(),
            ));
        }
        if self.rollout.page_size == 0 {
            return Err(FwpushError::Config("rollout.page_size must be positive".into()));
        }
        if self.api.max_pages == Some(0) {
            return Err(FwpushError::Config("api.max_pages must be positive".into()));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut base_url = self.api.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        ClientConfig {
            base_url,
            application_id: self.api.application_id.clone(),
            token: self.api.token.clone(),
            company_id: self.api.company_id.clone(),
            api_version: self.api.api_version.clone(),
            throttle: Duration::from_millis(self.api.throttle_ms),
            max_pages: self.api.max_pages,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
[api]
base_url = "https://api.example.test/v2"
application_id = "app-1"
token = "secret"
company_id = "company-9"
throttle_ms = 50
max_pages = 20

[rollout]
agent_types = ["IXrouter3"]
page_size = 250

[permissions]
manage_devices = "MANAGE_DEVICES"
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_full() {
        let config = AppConfig::parse(FULL).unwrap();
        assert_eq!(config.api.application_id, "app-1");
        assert_eq!(config.api.api_version, "2");
        assert_eq!(config.api.max_pages, Some(20));
        assert_eq!(config.rollout.agent_types, vec!["IXrouter3"]);
        assert_eq!(config.rollout.page_size, 250);
        assert_eq!(config.permissions.manage_devices, "MANAGE_DEVICES");
        assert_eq!(config.permissions.company_admin, "COMPANY_ADMIN");
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.api.base_url, "https://portal.ixon.cloud/api/");
        assert_eq!(config.api.throttle_ms, 200);
        assert_eq!(config.rollout.agent_types, vec!["IXrouter2", "IXrouter3"]);
        assert_eq!(config.rollout.page_size, 1000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_config() {
        let client = AppConfig::parse(FULL).unwrap().client_config();
        assert_eq!(client.base_url, "https://api.example.test/v2/");
        assert_eq!(client.company_id.as_deref(), Some("company-9"));
        assert_eq!(client.throttle, Duration::from_millis(50));
        assert_eq!(client.max_pages, Some(20));
    }

    #[test]
    fn test_env_fills_missing_credentials() {
        let mut config = AppConfig::parse("[rollout]\nagent_types = [\"IXrouter2\"]\n").unwrap();
        config.apply_env(env(&[
            (ENV_APPLICATION_ID, "env-app"),
            (ENV_TOKEN, "env-token"),
            (ENV_COMPANY_ID, ""),
        ]));
        assert_eq!(config.api.application_id, "env-app");
        assert_eq!(config.api.token, "env-token");
        assert_eq!(config.api.company_id, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_file_values_beat_env_credentials() {
        let mut config = AppConfig::parse(FULL).unwrap();
        config.apply_env(env(&[
            (ENV_API_URL, "http://localhost:9000/"),
            (ENV_TOKEN, "env-token"),
        ]));
        assert_eq!(config.api.token, "secret");
        assert_eq!(config.api.base_url, "http://localhost:9000/");
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = AppConfig::parse(FULL).unwrap();
        config.rollout.page_size = 0;
        assert!(matches!(config.validate(), Err(FwpushError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api.token, "secret");
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[api\nbase_url = 1").unwrap();

        let result = AppConfig::from_file(file.path());
        assert!(matches!(result, Err(FwpushError::Config(msg)) if msg.contains("parse")));
    }
}
