//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Bearer token verification.
    pub auth: AuthConfig,
    /// Per-user quotas and input limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Counter reconciliation.
    #[serde(default)]
    pub tally: TallyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// JWT verification settings.
///
/// Tokens are issued by the external identity provider; this service only
/// verifies them.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret.
    pub jwt_secret: String,
    /// Expected `aud` claim.
    #[serde(default = "default_audience")]
    pub audience: String,
}

/// Quotas and input limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum popularity votes a user may hold at once.
    #[serde(default = "default_popularity_vote_cap")]
    pub popularity_vote_cap: u64,
    /// Fight cards a user may create per local day.
    #[serde(default = "default_daily_fight_cards")]
    pub daily_fight_cards: u64,
    /// Fighter requests a user may submit per local day.
    #[serde(default = "default_daily_fighter_requests")]
    pub daily_fighter_requests: u64,
    /// Maximum length (in characters) of a requested fighter name.
    #[serde(default = "default_fighter_name_max_len")]
    pub fighter_name_max_len: usize,
    /// IANA timezone that defines "today" for daily quotas.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            popularity_vote_cap: default_popularity_vote_cap(),
            daily_fight_cards: default_daily_fight_cards(),
            daily_fighter_requests: default_daily_fighter_requests(),
            fighter_name_max_len: default_fighter_name_max_len(),
            timezone: default_timezone(),
        }
    }
}

/// Counter reconciliation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TallyConfig {
    /// Seconds between background reconciliation runs. `0` disables the task.
    #[serde(default)]
    pub reconcile_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_audience() -> String {
    "authenticated".to_string()
}

const fn default_popularity_vote_cap() -> u64 {
    30
}

const fn default_daily_fight_cards() -> u64 {
    3
}

const fn default_daily_fighter_requests() -> u64 {
    1
}

const fn default_fighter_name_max_len() -> usize {
    30
}

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `TAISEN_ENV`)
    /// 3. Environment variables with `TAISEN__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("TAISEN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TAISEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file, still honoring `TAISEN__*`
    /// overrides. The server uses this when `TAISEN_CONFIG` is set.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TAISEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/taisen"

            [auth]
            jwt_secret = "secret"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.audience, "authenticated");
        assert_eq!(config.limits.popularity_vote_cap, 30);
        assert_eq!(config.limits.daily_fight_cards, 3);
        assert_eq!(config.limits.daily_fighter_requests, 1);
        assert_eq!(config.limits.fighter_name_max_len, 30);
        assert_eq!(config.limits.timezone, "Asia/Tokyo");
        assert_eq!(config.tally.reconcile_interval_secs, 0);
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/taisen"
            max_connections = 5

            [auth]
            jwt_secret = "secret"

            [limits]
            popularity_vote_cap = 10
            timezone = "UTC"

            [tally]
            reconcile_interval_secs = 600
            "#,
        );

        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.limits.popularity_vote_cap, 10);
        assert_eq!(config.limits.daily_fight_cards, 3);
        assert_eq!(config.limits.timezone, "UTC");
        assert_eq!(config.tally.reconcile_interval_secs, 600);
    }

    #[test]
    fn test_missing_database_is_error() {
        let result = config::Config::builder()
            .add_source(config::File::from_str(
                "[auth]\njwt_secret = \"x\"",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<Config>();

        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("taisen-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[database]\nurl = \"postgres://db/taisen\"\n\n[auth]\njwt_secret = \"s\"\n\n[limits]\ndaily_fight_cards = 5\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.database.url, "postgres://db/taisen");
        assert_eq!(config.limits.daily_fight_cards, 5);
        assert_eq!(config.limits.popularity_vote_cap, 30);
    }
}
