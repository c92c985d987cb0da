//! Configuration structures for the invoicing service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::models::invoice::IssuerProfile;

/// Main configuration for the factura service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacturaConfig {
    /// HTTP server and public URL configuration.
    pub server: ServerConfig,

    /// Issuer identity printed on every invoice.
    pub issuer: IssuerProfile,

    /// Record store configuration.
    pub store: StoreConfig,

    /// Outbound email configuration.
    pub mail: MailConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,

    /// Public base URL used to build document links.
    pub base_url: String,

    /// Directory where generated PDFs are written and served from.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            base_url: "http://localhost:5000".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Which record store implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Supabase (PostgREST) table over HTTPS.
    #[default]
    Supabase,
    /// Local JSON-lines file, one record per line.
    Jsonl,
    /// Process memory; records are lost on exit.
    Memory,
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Selected backend.
    pub backend: StoreBackend,

    /// Supabase project URL (e.g. `https://xyz.supabase.co`).
    pub supabase_url: String,

    /// Supabase API key.
    pub supabase_key: String,

    /// Table holding invoice records.
    pub table: String,

    /// File used by the `jsonl` backend.
    pub jsonl_path: PathBuf,

    /// Request timeout for the remote store in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Supabase,
            supabase_url: String::new(),
            supabase_key: String::new(),
            table: "facturas".to_string(),
            jsonl_path: PathBuf::from("facturas.jsonl"),
            timeout_secs: 30,
        }
    }
}

/// Outbound email configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Send invoices by email. When false, delivery is skipped.
    pub enabled: bool,

    /// SMTP relay host (implicit TLS).
    pub smtp_host: String,

    /// SMTP relay port.
    pub smtp_port: u16,

    /// Sender address, also the SMTP username.
    pub sender: String,

    /// SMTP password (app password for Gmail).
    pub password: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            sender: String::new(),
            password: String::new(),
        }
    }
}

impl FacturaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override secrets and deployment settings from environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SUPABASE_URL") {
            self.store.supabase_url = v;
        }
        if let Some(v) = get("SUPABASE_KEY") {
            self.store.supabase_key = v;
        }
        if let Some(v) = get("EMAIL_SENDER") {
            self.mail.sender = v;
        }
        if let Some(v) = get("EMAIL_PASS") {
            self.mail.password = v;
        }
        if let Some(v) = get("FACTURA_BASE_URL") {
            self.server.base_url = v;
        }
    }

    /// Check that the settings required by the selected backends are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("server.base_url"));
        }
        if self.server.static_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("server.static_dir"));
        }

        if self.store.backend == StoreBackend::Supabase {
            if self.store.supabase_url.trim().is_empty() {
                return Err(ConfigError::Missing("store.supabase_url"));
            }
            if self.store.supabase_key.trim().is_empty() {
                return Err(ConfigError::Missing("store.supabase_key"));
            }
            if self.store.table.trim().is_empty() {
                return Err(ConfigError::Missing("store.table"));
            }
        }

        if self.mail.enabled {
            if self.mail.sender.trim().is_empty() {
                return Err(ConfigError::Missing("mail.sender"));
            }
            if self.mail.password.is_empty() {
                return Err(ConfigError::Missing("mail.password"));
            }
            if self.mail.smtp_port == 0 {
                return Err(ConfigError::Invalid {
                    key: "mail.smtp_port",
                    reason: "port must be non-zero".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: FacturaConfig =
            serde_json::from_str(r#"{"store": {"backend": "jsonl"}}"#).unwrap();

        assert_eq!(config.store.backend, StoreBackend::Jsonl);
        assert_eq!(config.store.table, "facturas");
        assert_eq!(config.mail.smtp_port, 465);
        assert_eq!(config.issuer.name, "Mia-Shoes");
    }

    #[test]
    fn test_env_overrides_secrets() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "secret"),
            ("EMAIL_SENDER", "ventas@example.com"),
            ("EMAIL_PASS", "app-pass"),
            ("FACTURA_BASE_URL", "   "),
        ]);
        let mut config = FacturaConfig::default();
        config.apply_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.supabase_url, "https://abc.supabase.co");
        assert_eq!(config.store.supabase_key, "secret");
        assert_eq!(config.mail.sender, "ventas@example.com");
        assert_eq!(config.mail.password, "app-pass");
        assert_eq!(config.server.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_validate_requires_backend_settings() {
        let config = FacturaConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("store.supabase_url"))
        ));

        let mut config = FacturaConfig::default();
        config.store.backend = StoreBackend::Memory;
        config.mail.enabled = false;
        assert!(config.validate().is_ok());

        config.mail.enabled = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("mail.sender"))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FacturaConfig::default();
        config.server.base_url = "https://facturas.example.com".to_string();
        config.save(&path).unwrap();

        let loaded = FacturaConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
