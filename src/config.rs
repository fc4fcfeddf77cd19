use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use tower_sessions::cookie::Key;

/// Minimum length of `SECRET_KEY`; the cookie signing key needs 64 bytes.
pub const MIN_SECRET_KEY_LEN: usize = 64;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Full PostgreSQL URL. Takes precedence over the `DB_*` parts.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    #[serde(default = "default_db_user")]
    pub db_user: String,

    #[serde(default)]
    pub db_password: String,

    /// Client character set. The postgres driver only speaks UTF8.
    #[serde(default = "default_db_charset")]
    pub db_charset: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    /// Session cookie signing secret
    pub secret_key: String,

    /// Redis URL for the session store; sessions stay in memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Sessions expire after this much inactivity
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Apply pending migrations at startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "movie_review_system".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_charset() -> String {
    "UTF8".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_session_ttl_minutes() -> i64 {
    24 * 60
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_run_migrations() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret_key.len() < MIN_SECRET_KEY_LEN {
            anyhow::bail!(
                "SECRET_KEY must be at least {} bytes long (got {})",
                MIN_SECRET_KEY_LEN,
                self.secret_key.len()
            );
        }

        let charset = self.db_charset.to_ascii_uppercase().replace('-', "");
        if !matches!(charset.as_str(), "UTF8" | "UTF8MB4") {
            anyhow::bail!("Unsupported DB_CHARSET {:?}: only UTF8 is supported", self.db_charset);
        }

        if self.session_ttl_minutes <= 0 {
            anyhow::bail!("SESSION_TTL_MINUTES must be positive");
        }

        Ok(())
    }

    /// Connection options assembled from `DATABASE_URL` or the `DB_*` parts
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.database_url {
            return Ok(url.parse()?);
        }

        let mut options = PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .database(&self.db_name)
            .username(&self.db_user);

        if !self.db_password.is_empty() {
            options = options.password(&self.db_password);
        }

        Ok(options)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Cookie signing key derived from `SECRET_KEY`
    pub fn session_key(&self) -> anyhow::Result<Key> {
        Key::try_from(self.secret_key.as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid SECRET_KEY: {}", e))
    }

    pub fn session_ttl(&self) -> time::Duration {
        time::Duration::minutes(self.session_ttl_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secret(secret: &str) -> Config {
        Config {
            database_url: None,
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_name: default_db_name(),
            db_user: default_db_user(),
            db_password: String::new(),
            db_charset: default_db_charset(),
            db_max_connections: default_max_connections(),
            secret_key: secret.to_string(),
            redis_url: None,
            session_ttl_minutes: default_session_ttl_minutes(),
            host: default_host(),
            port: default_port(),
            run_migrations: true,
        }
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = config_with_secret("too-short");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_long_secret_accepted() {
        let config = config_with_secret(&"k".repeat(MIN_SECRET_KEY_LEN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_utf8_charset_rejected() {
        let mut config = config_with_secret(&"k".repeat(MIN_SECRET_KEY_LEN));
        config.db_charset = "latin1".to_string();
        assert!(config.validate().is_err());

        config.db_charset = "utf-8".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_url_overrides_parts() {
        let mut config = config_with_secret(&"k".repeat(MIN_SECRET_KEY_LEN));
        config.database_url = Some("postgres://alice:pw@db.internal:6543/reviews".to_string());

        let options = config.connect_options().unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("reviews"));
    }

    #[test]
    fn test_session_key_from_secret() {
        let config = config_with_secret(&"k".repeat(MIN_SECRET_KEY_LEN));
        assert!(config.session_key().is_ok());
        assert_eq!(config.session_ttl(), time::Duration::days(1));

        assert!(config_with_secret("short").session_key().is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = config_with_secret(&"k".repeat(MIN_SECRET_KEY_LEN));
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
    }
}
