//! Gateway configuration
//!
//! One YAML document configures every service. All sections are optional
//! and fall back to local defaults, so a deployment only writes what it
//! changes.

use crate::database::DatabaseKind;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Top-Level Gateway Config
// ============================================================================

/// Complete gateway configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub requester: RequesterConfig,
    pub keystone: KeystoneConfig,
    pub monasca: MonascaConfig,

    /// Relational topology store (orchestration)
    pub topology_database: Option<DatabaseConfig>,

    /// Document store holding symptoms, TALs and models (autonomous)
    pub tal_database: Option<DatabaseConfig>,

    pub service_inventory: Option<String>,
    pub app_catalogue: Option<String>,
    pub tal_service: Option<String>,
    pub tal_engine: Option<String>,

    pub policy: PolicyConfig,
}

impl GatewayConfig {
    /// Timeout applied to every backend HTTP call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.requester.timeout_ms)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.requester.timeout_ms == 0 {
            return Err(Error::invalid_config("requester.timeout_ms", "must be positive"));
        }
        if self.monasca.timeout_ms == Some(0) {
            return Err(Error::invalid_config("monasca.timeout_ms", "must be positive"));
        }

        validate_url("keystone.url", &self.keystone.url)?;
        validate_url("monasca.url", &self.monasca.url)?;
        validate_url("monasca.keystone", &self.monasca.keystone)?;

        for (field, value) in [
            ("service_inventory", &self.service_inventory),
            ("app_catalogue", &self.app_catalogue),
            ("tal_service", &self.tal_service),
            ("tal_engine", &self.tal_engine),
        ] {
            if let Some(url) = value {
                validate_url(field, url)?;
            }
        }

        for (field, db) in [
            ("topology_database", &self.topology_database),
            ("tal_database", &self.tal_database),
        ] {
            if let Some(db) = db {
                db.connection_string()
                    .map_err(|e| Error::invalid_config(field, e.to_string()))?;
            }
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::invalid_config(field, format!("'{value}' is not a valid URL: {e}")))
}

// ============================================================================
// Server
// ============================================================================

/// The five gateway services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Identity,
    Monitoring,
    Autonomous,
    Orchestration,
    Catalogue,
}

impl Service {
    pub const ALL: [Service; 5] = [
        Service::Identity,
        Service::Monitoring,
        Service::Autonomous,
        Service::Orchestration,
        Service::Catalogue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Service::Identity => "identity",
            Service::Monitoring => "monitoring",
            Service::Autonomous => "autonomous",
            Service::Orchestration => "orchestration",
            Service::Catalogue => "catalogue",
        }
    }
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Base path overrides by service name
    pub base_paths: HashMap<Service, String>,

    /// Services not mounted when serving all of them
    pub exclude: Vec<Service>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_paths: HashMap::new(),
            exclude: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Mount point of a service, without trailing slash
    pub fn base_path(&self, service: Service) -> String {
        self.base_paths
            .get(&service)
            .map_or_else(
                || format!("/nbi/{}/api", service.name()),
                |p| p.trim_end_matches('/').to_string(),
            )
    }
}

// ============================================================================
// Backends
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequesterConfig {
    pub timeout_ms: u64,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

/// Keystone v3 endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoneConfig {
    pub url: String,

    /// Domain whose admins may manage every tenant
    pub admin_tenant: String,
}

impl Default for KeystoneConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000/v3/".to_string(),
            admin_tenant: "default".to_string(),
        }
    }
}

/// Monasca endpoint and the service credentials used to call it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonascaConfig {
    pub url: String,

    /// Overrides `requester.timeout_ms` for Monasca calls
    pub timeout_ms: Option<u64>,

    /// Keystone used to obtain the service token
    pub keystone: String,

    /// Keystone `auth` object posted to `auth/tokens`
    pub auth: serde_json::Value,
}

impl Default for MonascaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8070/v2.0/".to_string(),
            timeout_ms: None,
            keystone: "http://localhost:5000/v3/".to_string(),
            auth: serde_json::Value::Null,
        }
    }
}

impl MonascaConfig {
    pub fn timeout(&self, fallback: Duration) -> Duration {
        self.timeout_ms.map_or(fallback, Duration::from_millis)
    }
}

// ============================================================================
// Databases
// ============================================================================

/// A relational or document database attached through DuckDB
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub kind: DatabaseKind,

    /// Full connection string; takes precedence over the components below
    pub connection: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,

    /// Schema holding the tables, when not the backend default
    pub schema: Option<String>,

    /// Table name overrides by entity name
    pub tables: HashMap<String, String>,
}

impl DatabaseConfig {
    /// Connection string for the configured backend
    pub fn connection_string(&self) -> Result<String> {
        if let Some(connection) = &self.connection {
            return Ok(connection.clone());
        }

        let database = self
            .database
            .as_deref()
            .ok_or_else(|| Error::config("database needs 'connection' or 'database'"))?;

        let conn = match self.kind {
            DatabaseKind::Postgres => {
                let mut parts = vec![format!("dbname={database}")];
                if let Some(host) = &self.host {
                    parts.push(format!("host={host}"));
                }
                if let Some(port) = self.port {
                    parts.push(format!("port={port}"));
                }
                if let Some(user) = &self.user {
                    parts.push(format!("user={user}"));
                }
                if let Some(password) = &self.password {
                    parts.push(format!("password={password}"));
                }
                parts.join(" ")
            }
            DatabaseKind::Mysql => {
                let mut parts = vec![format!("database={database}")];
                if let Some(host) = &self.host {
                    parts.push(format!("host={host}"));
                }
                if let Some(port) = self.port {
                    parts.push(format!("port={port}"));
                }
                if let Some(user) = &self.user {
                    parts.push(format!("user={user}"));
                }
                if let Some(password) = &self.password {
                    parts.push(format!("password={password}"));
                }
                parts.join(" ")
            }
            DatabaseKind::Sqlite | DatabaseKind::Duckdb => database.to_string(),
        };
        Ok(conn)
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Allowed roles per `"<scope>:<action>"` rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Roles allowed for actions without a rule
    pub default: Vec<String>,
    pub rules: HashMap<String, Vec<String>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let rule = |roles: &[&str]| roles.iter().map(|r| (*r).to_string()).collect::<Vec<_>>();
        Self {
            default: rule(&["admin"]),
            rules: HashMap::from([
                ("Tenant:default".to_string(), rule(&["admin"])),
                ("User:create".to_string(), rule(&["tenant_admin"])),
                ("User:update".to_string(), rule(&["tenant_admin"])),
                ("User:delete".to_string(), rule(&["tenant_admin"])),
                ("Role:list".to_string(), rule(&["*"])),
                ("Role:default".to_string(), rule(&["admin"])),
            ]),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate a gateway configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), "loading gateway config");
    load_config_from_str(&content)
}

/// Load and validate a gateway configuration from YAML text
pub fn load_config_from_str(yaml: &str) -> Result<GatewayConfig> {
    let config: GatewayConfig = if yaml.trim().is_empty() {
        GatewayConfig::default()
    } else {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse gateway YAML: {e}")))?
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.server.base_path(Service::Monitoring), "/nbi/monitoring/api");
        assert!(config.topology_database.is_none());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
server:
  port: 9000
  base_paths:
    catalogue: /apps/
  exclude: [identity]
requester:
  timeout_ms: 2500
keystone:
  url: http://keystone:5000/v3/
monasca:
  url: http://monasca:8070/v2.0/
  timeout_ms: 500
  keystone: http://keystone:5000/v3/
  auth:
    identity:
      methods: [password]
topology_database:
  type: postgres
  host: db
  port: 5432
  database: topology
  user: selfnet
  password: secret
  tables:
    ue: lte_ue
tal_database:
  type: duckdb
  connection: /var/lib/selfnet/tal.duckdb
app_catalogue: http://catalogue:8080/apps/
policy:
  default: [admin, operator]
"#;
        let config = load_config_from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.base_path(Service::Catalogue), "/apps");
        assert_eq!(config.server.exclude, vec![Service::Identity]);
        assert_eq!(config.monasca.timeout(config.request_timeout()), Duration::from_millis(500));

        let topology = config.topology_database.unwrap();
        assert_eq!(topology.kind, DatabaseKind::Postgres);
        assert_eq!(topology.tables["ue"], "lte_ue");
        assert_eq!(
            topology.connection_string().unwrap(),
            "dbname=topology host=db port=5432 user=selfnet password=secret"
        );
        assert_eq!(
            config.tal_database.unwrap().connection_string().unwrap(),
            "/var/lib/selfnet/tal.duckdb"
        );
        assert_eq!(config.policy.default, vec!["admin", "operator"]);
        assert!(config.policy.rules.contains_key("Role:list"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = load_config_from_str("requester:\n  timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_bad_url_rejected() {
        let err = load_config_from_str("keystone:\n  url: not a url\n").unwrap_err();
        assert!(err.to_string().contains("keystone.url"));
    }

    #[test]
    fn test_unsupported_database_type_rejected() {
        let err = load_config_from_str("tal_database:\n  type: mongodb\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_database_without_target_rejected() {
        let err = load_config_from_str("topology_database:\n  type: postgres\n").unwrap_err();
        assert!(err.to_string().contains("topology_database"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  host: 127.0.0.1").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/gateway.yaml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
