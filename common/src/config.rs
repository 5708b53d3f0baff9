//! Application configuration.
//!
//! Everything is read from environment variables. A `.env` file, when
//! present, is loaded by the binary before [`AppConfig::load_with_service`]
//! runs.

use std::env;

use uuid::Uuid;

/// Default number of rows shown per result page.
pub const DEFAULT_MAX_ROWS: u32 = 25;

/// Top-level configuration for a service process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name, used in logs and response metadata.
    pub service_name: String,
    /// Address the HTTP listener binds to.
    pub host: String,
    /// Port the HTTP listener binds to.
    pub port: u16,
    /// Upper bound for the MySQL connection pool.
    pub max_connections: u32,
    /// Seconds to wait when acquiring a pooled connection.
    pub connect_timeout_secs: u64,
    /// The MySQL server being administered.
    pub server: ServerConfig,
}

/// Settings for the administered MySQL server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Configuration storage database. Empty disables every storage feature.
    pub pmadb: String,
    /// Database name patterns (LIKE syntax) the user is restricted to.
    pub only_db: Vec<String>,
    /// Regular expression of database names hidden from listings.
    pub hide_db: Option<String>,
    /// Avoid `information_schema` queries.
    pub disable_is: bool,
    /// Rows per result page.
    pub max_rows: u32,
    /// Key used to sign where clauses handed to the browser.
    pub signing_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            pmadb: String::new(),
            only_db: Vec::new(),
            hide_db: None,
            disable_is: false,
            max_rows: DEFAULT_MAX_ROWS,
            signing_secret: String::new(),
        }
    }
}

impl ServerConfig {
    /// Reads the server section from `DB_*` and related variables.
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("DB_HOST").unwrap_or(defaults.host),
            port: parse_var("DB_PORT").unwrap_or(defaults.port),
            user: env::var("DB_USER").unwrap_or(defaults.user),
            password: env::var("DB_PASSWORD").ok().filter(|p| !p.is_empty()),
            pmadb: env::var("PMADB").unwrap_or_default(),
            only_db: env::var("ONLY_DB")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            hide_db: env::var("HIDE_DB").ok().filter(|v| !v.is_empty()),
            disable_is: parse_bool("DISABLE_IS").unwrap_or(false),
            max_rows: parse_var("MAX_ROWS")
                .filter(|rows: &u32| *rows > 0)
                .unwrap_or(DEFAULT_MAX_ROWS),
            // A per-process secret keeps signatures valid until restart.
            signing_secret: env::var("SIGNING_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Connection URL for the MySQL driver.
    pub fn database_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}",
            self.user,
            self.password.as_deref().unwrap_or(""),
            self.host,
            self.port
        )
    }
}

impl AppConfig {
    /// Loads the configuration for the named service.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("SERVER_PORT").unwrap_or(8080),
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(10),
            connect_timeout_secs: parse_var("DB_CONNECT_TIMEOUT_SECS").unwrap_or(5),
            server: ServerConfig::load(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
