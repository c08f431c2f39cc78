//! Connection configuration for the MySQL pool.

use std::time::Duration;
use url::Url;

pub const DEFAULT_POOL_NAME: &str = "sql_agent_pool";
pub const DEFAULT_POOL_SIZE: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Explicit connection configuration handed to the connection provider.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Contains sensitive data - never log
    pub connection_string: String,
    /// Label used in logs; MySQL has no notion of pool names.
    pub pool_name: String,
    pub pool_size: u32,
    pub acquire_timeout: Duration,
    /// Per-statement execution timeout
    pub query_timeout: Duration,
}

/// Errors that can occur when building a connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionConfigError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported scheme '{0}', expected mysql:// or mariadb://")]
    UnsupportedScheme(String),

    #[error("Pool size must be greater than 0")]
    ZeroPoolSize,
}

impl ConnectionConfig {
    /// Create a configuration from a `mysql://` URL with default pool settings.
    pub fn new(connection_string: impl Into<String>) -> Result<Self, ConnectionConfigError> {
        let connection_string = connection_string.into();
        let url = Url::parse(&connection_string)
            .map_err(|e| ConnectionConfigError::InvalidUrl(e.to_string()))?;

        match url.scheme() {
            "mysql" | "mariadb" => {}
            other => return Err(ConnectionConfigError::UnsupportedScheme(other.to_string())),
        }

        Ok(Self {
            connection_string,
            pool_name: DEFAULT_POOL_NAME.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        })
    }

    /// Build a `mysql://` URL from discrete host/port/user/password/database
    /// settings. Credentials are percent-encoded by the URL builder.
    pub fn from_parts(
        host: &str,
        port: u16,
        user: &str,
        password: Option<&str>,
        database: Option<&str>,
    ) -> Result<Self, ConnectionConfigError> {
        let mut url = Url::parse("mysql://localhost")
            .map_err(|e| ConnectionConfigError::InvalidUrl(e.to_string()))?;
        let invalid = |what: &str| ConnectionConfigError::InvalidUrl(format!("invalid {what}"));

        url.set_host(Some(host)).map_err(|_| invalid("host"))?;
        url.set_port(Some(port)).map_err(|_| invalid("port"))?;
        url.set_username(user).map_err(|_| invalid("user"))?;
        url.set_password(password).map_err(|_| invalid("password"))?;
        if let Some(db) = database.filter(|d| !d.is_empty()) {
            url.set_path(&format!("/{db}"));
        }

        Self::new(url.to_string())
    }

    pub fn with_pool_name(mut self, pool_name: impl Into<String>) -> Self {
        self.pool_name = pool_name.into();
        self
    }

    pub fn with_pool_size(mut self, pool_size: u32) -> Result<Self, ConnectionConfigError> {
        if pool_size == 0 {
            return Err(ConnectionConfigError::ZeroPoolSize);
        }
        self.pool_size = pool_size;
        Ok(self)
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Database name from the URL path, if any.
    pub fn database(&self) -> Option<String> {
        Url::parse(&self.connection_string).ok().and_then(|url| {
            url.path()
                .trim_start_matches('/')
                .split('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
    }

    /// Get a display-safe version of the connection string (password masked).
    pub fn masked_connection_string(&self) -> String {
        match Url::parse(&self.connection_string) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("****"));
                }
                url.to_string()
            }
            Err(_) => "<invalid url>".to_string(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("connection_string", &self.masked_connection_string())
            .field("pool_name", &self.pool_name)
            .field("pool_size", &self.pool_size)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}
