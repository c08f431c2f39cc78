//! Configuration handling for the SQL agent server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::models::{
    ConnectionConfig, DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_POOL_NAME, DEFAULT_POOL_SIZE,
    DEFAULT_QUERY_TIMEOUT_SECS,
};
use clap::{Parser, ValueEnum};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "root";

/// Pool option keys extracted from the database URL query string.
const POOL_OPTION_KEYS: &[&str] = &["pool_name", "pool_size", "acquire_timeout"];

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the SQL agent server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sql-agent-mcp",
    about = "MCP tool layer for MySQL administration - schema, DDL, reads/writes, export and insights",
    version,
    author
)]
pub struct Config {
    /// Full MySQL connection URL. Overrides the discrete --db-* options.
    /// Accepts ?pool_name=..&pool_size=..&acquire_timeout=.. query options.
    #[arg(short = 'd', long, value_name = "URL", env = "SQL_AGENT_DATABASE_URL")]
    pub database_url: Option<String>,

    /// MySQL host
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "SQL_AGENT_DB_HOST")]
    pub db_host: String,

    /// MySQL port
    #[arg(long, default_value_t = DEFAULT_DB_PORT, env = "SQL_AGENT_DB_PORT")]
    pub db_port: u16,

    /// MySQL user
    #[arg(long, default_value = DEFAULT_DB_USER, env = "SQL_AGENT_DB_USER")]
    pub db_user: String,

    /// MySQL password
    #[arg(long, env = "SQL_AGENT_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Default database (schema)
    #[arg(long, env = "SQL_AGENT_DB_NAME")]
    pub db_name: Option<String>,

    /// Connection pool name (used in logs)
    #[arg(long, default_value = DEFAULT_POOL_NAME, env = "SQL_AGENT_POOL_NAME")]
    pub pool_name: String,

    /// Maximum number of pooled connections
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "SQL_AGENT_POOL_SIZE")]
    pub pool_size: u32,

    /// Seconds to wait for a pooled connection
    #[arg(
        long,
        default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS,
        env = "SQL_AGENT_ACQUIRE_TIMEOUT"
    )]
    pub acquire_timeout: u64,

    /// Per-statement timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "SQL_AGENT_QUERY_TIMEOUT"
    )]
    pub query_timeout: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "SQL_AGENT_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "SQL_AGENT_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "SQL_AGENT_HTTP_PORT")]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "SQL_AGENT_MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SQL_AGENT_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "SQL_AGENT_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            database_url: None,
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            db_user: DEFAULT_DB_USER.to_string(),
            db_password: None,
            db_name: None,
            pool_name: DEFAULT_POOL_NAME.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Build the connection configuration.
    ///
    /// A `--database-url` wins over the discrete `--db-*` options. Pool options
    /// in the URL query string override the CLI values and are stripped
    /// before the URL reaches the driver.
    pub fn connection_config(&self) -> Result<ConnectionConfig, String> {
        let mut pool_name = self.pool_name.clone();
        let mut pool_size = self.pool_size;
        let mut acquire_timeout = self.acquire_timeout;

        let base = match &self.database_url {
            Some(raw) => {
                let mut url = Url::parse(raw).map_err(|e| format!("Invalid URL: {e}"))?;
                let mut opts = extract_options(&mut url, POOL_OPTION_KEYS);

                if let Some(name) = opts.remove("pool_name").filter(|n| !n.is_empty()) {
                    pool_name = name;
                }
                if let Some(size) = opts.remove("pool_size") {
                    pool_size = size
                        .parse()
                        .map_err(|_| format!("Invalid pool_size '{size}'"))?;
                }
                if let Some(secs) = opts.remove("acquire_timeout") {
                    acquire_timeout = secs
                        .parse()
                        .map_err(|_| format!("Invalid acquire_timeout '{secs}'"))?;
                }

                ConnectionConfig::new(url.to_string()).map_err(|e| e.to_string())?
            }
            None => ConnectionConfig::from_parts(
                &self.db_host,
                self.db_port,
                &self.db_user,
                self.db_password.as_deref(),
                self.db_name.as_deref(),
            )
            .map_err(|e| e.to_string())?,
        };

        base.with_pool_name(pool_name)
            .with_pool_size(pool_size)
            .map(|c| {
                c.with_acquire_timeout(Duration::from_secs(acquire_timeout))
                    .with_query_timeout(self.query_timeout_duration())
            })
            .map_err(|e| e.to_string())
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Extract pool options from URL query params, keeping others for the driver.
/// Uses proper URL encoding to preserve special characters in remaining params.
fn extract_options(url: &mut Url, keys: &[&str]) -> HashMap<String, String> {
    let mut opts = HashMap::new();
    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(k, v)| {
            let key_lower = k.to_ascii_lowercase();
            if keys.contains(&key_lower.as_str()) {
                opts.insert(key_lower, v.into_owned());
                None
            } else {
                Some((k.into_owned(), v.into_owned()))
            }
        })
        .collect();

    if remaining.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(remaining);
    }
    opts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.http_host, DEFAULT_HTTP_HOST);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.pool_name, "sql_agent_pool");
        assert_eq!(config.pool_size, 5);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_clap_parses_flags() {
        let config = Config::try_parse_from([
            "sql-agent-mcp",
            "--db-host",
            "db.internal",
            "--db-port",
            "3307",
            "--db-name",
            "finance",
            "--pool-size",
            "8",
            "--transport",
            "http",
        ])
        .unwrap();
        assert_eq!(config.db_host, "db.internal");
        assert_eq!(config.db_port, 3307);
        assert_eq!(config.db_name.as_deref(), Some("finance"));
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.transport, TransportMode::Http);
    }

    #[test]
    fn test_connection_config_from_parts() {
        let config = Config {
            db_host: "db.internal".to_string(),
            db_port: 3307,
            db_user: "agent".to_string(),
            db_password: Some("secret".to_string()),
            db_name: Some("finance".to_string()),
            ..Config::default()
        };
        let conn = config.connection_config().unwrap();
        assert_eq!(conn.database(), Some("finance".to_string()));
        assert_eq!(conn.pool_name, "sql_agent_pool");
        assert_eq!(conn.pool_size, 5);
        assert!(!conn.masked_connection_string().contains("secret"));
    }

    #[test]
    fn test_url_pool_options_override_flags() {
        let config = Config {
            database_url: Some(
                "mysql://root:pw@localhost:3306/shop?pool_name=reports&pool_size=12&acquire_timeout=5"
                    .to_string(),
            ),
            ..Config::default()
        };
        let conn = config.connection_config().unwrap();
        assert_eq!(conn.pool_name, "reports");
        assert_eq!(conn.pool_size, 12);
        assert_eq!(conn.acquire_timeout, Duration::from_secs(5));
        assert!(!conn.connection_string.contains("pool_size"));
        assert!(!conn.connection_string.contains("pool_name"));
    }

    #[test]
    fn test_url_preserves_driver_params() {
        let config = Config {
            database_url: Some(
                "mysql://root@localhost/shop?ssl-mode=disabled&pool_size=2".to_string(),
            ),
            ..Config::default()
        };
        let conn = config.connection_config().unwrap();
        assert!(conn.connection_string.contains("ssl-mode=disabled"));
        assert_eq!(conn.pool_size, 2);
    }

    #[test]
    fn test_invalid_pool_size_in_url() {
        let config = Config {
            database_url: Some("mysql://root@localhost/shop?pool_size=many".to_string()),
            ..Config::default()
        };
        let err = config.connection_config().unwrap_err();
        assert!(err.contains("pool_size"));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = Config {
            pool_size: 0,
            ..Config::default()
        };
        assert!(config.connection_config().is_err());
    }

    #[test]
    fn test_non_mysql_url_rejected() {
        let config = Config {
            database_url: Some("postgres://localhost/db".to_string()),
            ..Config::default()
        };
        assert!(config.connection_config().is_err());
    }

    #[test]
    fn test_query_timeout_duration() {
        let config = Config {
            query_timeout: 60,
            ..Config::default()
        };
        assert_eq!(config.query_timeout_duration(), Duration::from_secs(60));
        let conn = config.connection_config().unwrap();
        assert_eq!(conn.query_timeout, Duration::from_secs(60));
    }
}
