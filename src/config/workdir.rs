//! The `.gitlab` work-dir configuration file.
//!
//! ```toml
//! [global]
//! default = "origin"
//! base_group = "team"
//! timeout = 30
//! api_version = "4"
//!
//! [origin]
//! url = "https://gitlab.example.com"
//! private_token = "glpat-..."
//! ```
//!
//! `[global].default` names both the server table to use and the remote
//! alias every managed repository is expected to carry.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_HTTP_TIMEOUT, DEFAULT_REMOTE_NAME, WORKDIR_CONFIG_FILE,
};
use crate::core::BulkError;

fn default_remote() -> String {
    DEFAULT_REMOTE_NAME.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_ssl_verify() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_true(value: &bool) -> bool {
    *value
}

/// Connection settings for one GitLab server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL, e.g. `https://gitlab.example.com`
    pub url: String,

    /// Verify TLS certificates
    #[serde(default = "default_ssl_verify", skip_serializing_if = "is_true")]
    pub ssl_verify: bool,

    /// Personal access token sent as `PRIVATE-TOKEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_token: Option<String>,

    /// OAuth2 token sent as a bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,

    /// HTTP basic auth user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_username: Option<String>,

    /// HTTP basic auth password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_password: Option<String>,
}

impl ServerConfig {
    /// A server with only a URL set.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ssl_verify: true,
            private_token: None,
            oauth_token: None,
            http_username: None,
            http_password: None,
        }
    }

    /// The URL without trailing slashes, as compared against remote URLs.
    #[must_use]
    pub fn normalized_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// The `[global]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdirSettings {
    /// Server table name and primary remote alias
    #[serde(default = "default_remote")]
    pub default: String,

    /// Group path mirrored by the work-dir root
    pub base_group: String,

    /// HTTP timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// GitLab REST API version
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

/// Contents of a `.gitlab` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdirConfig {
    /// General settings
    pub global: WorkdirSettings,

    /// Server tables keyed by name
    #[serde(flatten)]
    pub servers: BTreeMap<String, ServerConfig>,
}

impl WorkdirConfig {
    /// A configuration mirroring `base_group` from the server named `remote`.
    pub fn new(base_group: impl Into<String>, remote: &str, server: ServerConfig) -> Self {
        let mut servers = BTreeMap::new();
        servers.insert(remote.to_string(), server);
        Self {
            global: WorkdirSettings {
                default: remote.to_string(),
                base_group: base_group.into(),
                timeout: None,
                api_version: default_api_version(),
            },
            servers,
        }
    }

    /// Read `<root>/.gitlab`.
    pub async fn load_from_root(root: &Path) -> Result<Self> {
        Self::load_from(&root.join(WORKDIR_CONFIG_FILE)).await
    }

    /// Read and validate a configuration file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read work-dir config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .map_err(BulkError::from)
            .with_context(|| format!("Failed to parse work-dir config from {}", path.display()))?;
        config.validate().with_context(|| format!("Invalid work-dir config {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration, readable by the owner only on Unix.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(BulkError::from)
            .context("Failed to serialize work-dir config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write work-dir config to {}", path.display()))?;

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

    fn validate(&self) -> Result<()> {
        let base = self.global.base_group.trim();
        if base.is_empty() || base.starts_with('/') || base.ends_with('/') {
            return Err(BulkError::configuration(format!(
                "base_group '{}' must be a group path such as 'team/backend'",
                self.global.base_group
            ))
            .into());
        }
        self.server()?;
        Ok(())
    }

    /// The server table named by `[global].default`.
    pub fn server(&self) -> Result<&ServerConfig> {
        self.servers.get(&self.global.default).ok_or_else(|| {
            BulkError::configuration(format!(
                "Server section '[{}]' is missing from {}",
                self.global.default, WORKDIR_CONFIG_FILE
            ))
            .into()
        })
    }

    /// HTTP timeout for API requests.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.global.timeout.map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs)
    }
}
