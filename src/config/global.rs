//! User-wide server configuration.
//!
//! `glbulk init` needs to know which GitLab servers exist and how to
//! authenticate against them. Those settings live outside any work-dir, in
//! `~/.glbulk/config.toml` (`%LOCALAPPDATA%\glbulk\config.toml` on Windows):
//!
//! ```toml
//! default = "work"
//!
//! [servers.work]
//! url = "https://gitlab.example.com"
//! private_token = "glpat-xxxxxxxxxxxx"
//!
//! [servers.public]
//! url = "https://gitlab.com"
//! ```
//!
//! The file may contain credentials and is written with owner-only
//! permissions on Unix.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::ServerConfig;
use crate::core::BulkError;
use crate::utils::get_home_dir;

/// Contents of the global configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Server used when none is named explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Known servers keyed by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub servers: BTreeMap<String, ServerConfig>,
}

impl GlobalConfig {
    /// Load from `path` when given, otherwise from [`Self::default_path`].
    ///
    /// A missing file yields an empty configuration.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No global config at {}", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .map_err(BulkError::from)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Write to `path`, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(BulkError::from)
            .context("Failed to serialize global config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write global config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read permissions for {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).await.with_context(|| {
                format!("Failed to set secure permissions on {}", path.display())
            })?;
        }

        Ok(())
    }

    /// Platform location of the global configuration file.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("glbulk")
        } else {
            get_home_dir()?.join(".glbulk")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Look up a server by name, falling back to `default`.
    pub fn server(&self, name: Option<&str>) -> Result<(&str, &ServerConfig)> {
        let name = name.or(self.default.as_deref()).ok_or_else(|| {
            BulkError::configuration(
                "No GitLab server given and no default server set in the global config",
            )
        })?;

        self.servers.get_key_value(name).map(|(k, v)| (k.as_str(), v)).ok_or_else(|| {
            BulkError::configuration(format!("GitLab server '{name}' is not configured")).into()
        })
    }

    /// Add or replace a server entry.
    pub fn add_server(&mut self, name: impl Into<String>, server: ServerConfig) {
        self.servers.insert(name.into(), server);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let config =
            GlobalConfig::load_with_optional(Some(temp.path().join("none.toml"))).await.unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = GlobalConfig {
            default: Some("work".to_string()),
            ..GlobalConfig::default()
        };
        config.add_server("work", ServerConfig::new("https://gitlab.example.com"));
        config.save_to(&path).await.unwrap();

        let loaded = GlobalConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_server_lookup() {
        let mut config = GlobalConfig::default();
        config.add_server("work", ServerConfig::new("https://gitlab.example.com"));
        config.add_server("public", ServerConfig::new("https://gitlab.com"));

        let err = config.server(None).unwrap_err();
        assert!(err.to_string().contains("No GitLab server given"));

        config.default = Some("work".to_string());
        let (name, server) = config.server(None).unwrap();
        assert_eq!(name, "work");
        assert_eq!(server.url, "https://gitlab.example.com");

        let (name, _) = config.server(Some("public")).unwrap();
        assert_eq!(name, "public");

        assert!(config.server(Some("missing")).is_err());
    }

    #[test]
    fn test_parse_servers_table() {
        let config: GlobalConfig = toml::from_str(
            r#"
default = "work"

[servers.work]
url = "https://gitlab.example.com"
ssl_verify = false
http_username = "bot"
http_password = "pw"
"#,
        )
        .unwrap();
        let (_, server) = config.server(None).unwrap();
        assert!(!server.ssl_verify);
        assert_eq!(server.http_username.as_deref(), Some("bot"));
    }
}
