use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: Option<String>,
    pub max_connections: Option<u32>,
    /// Run against the in-process store instead of PostgreSQL.
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign bearer tokens.
    pub secret: String,
    pub token_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            max_connections: Some(20),
            in_memory: false,
        }
    }
}

const DEFAULT_AUTH_SECRET: &str = "change-me";

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_AUTH_SECRET.to_string(),
            token_ttl_minutes: 30,
        }
    }
}

impl AuthConfig {
    /// True while tokens would be signed with the well-known default key.
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_AUTH_SECRET
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("config").required(false));

        // ECOGRAM__DATABASE__IN_MEMORY=true, ECOGRAM__AUTH__SECRET=...
        config = config.add_source(
            config::Environment::with_prefix("ECOGRAM")
                .separator("__")
                .prefix_separator("__")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the database URL from config or environment
    pub fn database_url(&self) -> anyhow::Result<String> {
        if let Some(connection_string) = &self.database.connection_string {
            return Ok(connection_string.clone());
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            return Ok(url);
        }

        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            var("POSTGRES_USER", "postgres"),
            var("POSTGRES_PASSWORD", "postgres"),
            var("POSTGRES_HOST", "localhost"),
            var("POSTGRES_PORT", "5432"),
            var("POSTGRES_DB", "ecogram"),
        ))
    }

    pub fn max_connections(&self) -> u32 {
        self.database.max_connections.unwrap_or(20)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
