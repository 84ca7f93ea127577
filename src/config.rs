//! Application configuration loaded from environment variables.

use std::env;

use secrecy::{ExposeSecret, SecretString};

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_DB_HOST: &str = "localhost";
    pub const DEV_DB_PORT: u16 = 5432;
    pub const DEV_DB_USER: &str = "tasktrack";
    pub const DEV_DB_PASSWORD: &str = "tasktrack";
    pub const DEV_DB_NAME: &str = "tasktrack";
    pub const DEV_DB_MAX_CONNECTIONS: u32 = 10;
    pub const DEV_DB_MIN_CONNECTIONS: u32 = 1;
    pub const DEV_JWT_SECRET: &str = "dev-jwt-secret-do-not-use-in-production";
    pub const DEV_JWT_TTL_SECS: u64 = 86_400; // 1 day
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// PostgreSQL connection settings.
///
/// Either a full `DATABASE_URL` or the individual `DB_*` parts. The URL wins
/// when both are present.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection string, if given
    pub url: Option<SecretString>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub name: String,
    /// Pool upper bound
    pub max_connections: u32,
    /// Pool lower bound
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Build the connection URL handed to SeaORM.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.expose_secret().to_string(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user,
                self.password.expose_secret(),
                self.host,
                self.port,
                self.name
            ),
        }
    }

    /// Connection target without credentials, safe to log.
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}:{}/{}", self.host, self.port, self.name),
        }
    }
}

/// JWT session settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC signing secret
    pub secret: SecretString,
    /// Token lifetime in seconds
    pub ttl_secs: u64,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// JWT settings
    pub jwt: JwtConfig,
    /// Apply pending migrations when the server starts
    pub auto_migrate: bool,
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    default: T,
    message: &'static str,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue(message)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development) every variable has a
    /// default. In production the server will NOT start while the database
    /// password or the JWT secret still carry development defaults.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `TT_HOST`: Server host (default: 127.0.0.1)
    /// - `TT_PORT`: Server port (default: 8080)
    /// - `DATABASE_URL`: PostgreSQL connection string (overrides `DB_*`)
    /// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`
    /// - `DB_MAX_CONNECTIONS` (default: 10), `DB_MIN_CONNECTIONS` (default: 1)
    /// - `TT_JWT_SECRET`: HMAC secret for session tokens
    /// - `TT_JWT_TTL_SECS`: Session lifetime (default: 86400)
    /// - `TT_AUTO_MIGRATE`: Run pending migrations on startup (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("TT_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());
        let port = parse_var("TT_PORT", defaults::DEV_PORT, "TT_PORT must be a valid port number")?;

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").ok().map(SecretString::from),
            host: env::var("DB_HOST").unwrap_or_else(|_| defaults::DEV_DB_HOST.to_string()),
            port: parse_var(
                "DB_PORT",
                defaults::DEV_DB_PORT,
                "DB_PORT must be a valid port number",
            )?,
            user: env::var("DB_USER").unwrap_or_else(|_| defaults::DEV_DB_USER.to_string()),
            password: SecretString::from(
                env::var("DB_PASSWORD").unwrap_or_else(|_| defaults::DEV_DB_PASSWORD.to_string()),
            ),
            name: env::var("DB_NAME").unwrap_or_else(|_| defaults::DEV_DB_NAME.to_string()),
            max_connections: parse_var(
                "DB_MAX_CONNECTIONS",
                defaults::DEV_DB_MAX_CONNECTIONS,
                "DB_MAX_CONNECTIONS must be a valid number",
            )?,
            min_connections: parse_var(
                "DB_MIN_CONNECTIONS",
                defaults::DEV_DB_MIN_CONNECTIONS,
                "DB_MIN_CONNECTIONS must be a valid number",
            )?,
        };

        let jwt = JwtConfig {
            secret: SecretString::from(
                env::var("TT_JWT_SECRET").unwrap_or_else(|_| defaults::DEV_JWT_SECRET.to_string()),
            ),
            ttl_secs: parse_var(
                "TT_JWT_TTL_SECS",
                defaults::DEV_JWT_TTL_SECS,
                "TT_JWT_TTL_SECS must be a valid number",
            )?,
        };

        let auto_migrate = parse_var(
            "TT_AUTO_MIGRATE",
            true,
            "TT_AUTO_MIGRATE must be 'true' or 'false'",
        )?;

        let config = Config {
            environment,
            host,
            port,
            database,
            jwt,
            auto_migrate,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database.url.is_none()
            && self.database.password.expose_secret() == defaults::DEV_DB_PASSWORD
        {
            errors.push(
                "DB_PASSWORD is using the development default. Set DATABASE_URL or a production password."
                    .to_string(),
            );
        }

        if self.jwt.secret.expose_secret() == defaults::DEV_JWT_SECRET {
            errors.push(
                "TT_JWT_SECRET is using the development default. Set a secure signing secret."
                    .to_string(),
            );
        }

        if self.jwt.ttl_secs == 0 {
            errors.push("TT_JWT_TTL_SECS must be greater than zero.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
