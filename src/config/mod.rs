//! Settings for the controller and admission webhook
//!
//! Every field has a default, so running without a settings file is the
//! normal in-cluster setup. A YAML file can override any subset of fields and
//! command-line flags override the file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default port the webhook listens on
pub const DEFAULT_WEBHOOK_PORT: u16 = 8080;

/// Default location of the webhook serving certificate
pub const DEFAULT_CERT_FILE: &str = "/etc/webhook-certs/server.crt";

/// Default location of the webhook serving key
pub const DEFAULT_KEY_FILE: &str = "/etc/webhook-certs/server.key";

/// Errors for loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),
}

/// Top-level settings file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub controller: ControllerSettings,
    pub webhook: WebhookSettings,
}

/// Node controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Name reported in logs
    pub name: String,

    /// Periodic resync for nodes that reconciled cleanly (seconds)
    pub requeue_secs: u64,

    /// Retry delay after a failed reconciliation (seconds)
    pub error_requeue_secs: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            name: "min-versions-controller".to_string(),
            requeue_secs: 300,
            error_requeue_secs: 15,
        }
    }
}

impl ControllerSettings {
    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }

    pub fn error_requeue_after(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }
}

/// What the webhook does with a pod whose minimum-version label is malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Admit the pod without a version constraint
    #[default]
    Allow,
    /// Reject the admission request
    Deny,
}

/// Admission webhook settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub listen_addr: String,
    pub port: u16,

    /// Terminate TLS in-process with the certificate below
    pub tls: bool,
    pub cert_file: PathBuf,
    pub key_file: PathBuf,

    pub on_malformed: MalformedPolicy,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: DEFAULT_WEBHOOK_PORT,
            tls: true,
            cert_file: PathBuf::from(DEFAULT_CERT_FILE),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            on_malformed: MalformedPolicy::Allow,
        }
    }
}

impl WebhookSettings {
    /// Socket address built from `listen_addr` and `port`
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.listen_addr, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddress(addr.clone()))
    }
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Parse settings from YAML. An empty document yields the defaults.
pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

/// Load and parse a settings file from disk
pub fn load_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Default kubeconfig location: `$KUBECONFIG`, else `~/.kube/config`
pub fn default_kubeconfig_path() -> PathBuf {
    if let Some(path) = std::env::var_os("KUBECONFIG").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kube")
        .join("config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.webhook.port, 8080);
        assert!(settings.webhook.tls);
        assert_eq!(settings.webhook.on_malformed, MalformedPolicy::Allow);
        assert_eq!(settings.controller.name, "min-versions-controller");
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
webhook:
  port: 9443
  on_malformed: deny
controller:
  error_requeue_secs: 5
"#;
        let settings = parse_settings(yaml).unwrap();

        assert_eq!(settings.webhook.port, 9443);
        assert_eq!(settings.webhook.on_malformed, MalformedPolicy::Deny);
        assert_eq!(settings.webhook.cert_file, PathBuf::from(DEFAULT_CERT_FILE));
        assert_eq!(settings.controller.error_requeue_after(), Duration::from_secs(5));
        assert_eq!(settings.controller.requeue_secs, 300);
    }

    #[test]
    fn test_invalid_policy() {
        let result = parse_settings("webhook:\n  on_malformed: maybe\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_socket_addr() {
        let webhook = WebhookSettings::default();
        assert_eq!(webhook.socket_addr().unwrap().port(), 8080);

        let bad = WebhookSettings {
            listen_addr: "not an address".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad.socket_addr(), Err(ConfigError::InvalidAddress(_))));
    }

    #[test]
    fn test_load_settings_file() {
        let file = create_temp_file("webhook:\n  tls: false\n");
        let settings = load_settings_file(file.path()).unwrap();
        assert!(!settings.webhook.tls);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_settings_file(Path::new("/nonexistent/settings.yaml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
