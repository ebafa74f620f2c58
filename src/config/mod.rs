use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Secret mixed into every visitor hash. Rotating it unlinks all
    /// previously recorded visitors.
    #[serde(skip_serializing)]
    pub salt: String,

    /// Whether `salt` was generated at startup rather than configured
    #[serde(default)]
    pub ephemeral_salt: bool,

    /// Path to a MaxMind GeoLite2/GeoIP2 Country or City .mmdb file
    #[serde(default)]
    pub geoip_db_path: Option<String>,
}

impl DatabaseConfig {
    const fn default_max_connections() -> u32 {
        10
    }
}

impl AnalyticsConfig {
    /// Build a config with the given salt and no GeoIP database
    pub fn with_salt(salt: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            ephemeral_salt: false,
            geoip_db_path: None,
        }
    }
}

/// Generate a random 256-bit salt rendered as hex
pub fn generate_salt() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./cicerone.db?mode=rwc".to_string());

        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            Err(_) => DatabaseConfig::default_max_connections(),
        };

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let (salt, ephemeral_salt) = match std::env::var("ANALYTICS_SALT") {
            Ok(s) if !s.trim().is_empty() => (s, false),
            _ => (generate_salt(), true),
        };

        let geoip_db_path = std::env::var("GEOIP_DB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            analytics: AnalyticsConfig {
                salt,
                ephemeral_salt,
                geoip_db_path,
            },
        })
    }
}
