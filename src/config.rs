use anyhow::{bail, Context};
use serde::Deserialize;

const MIN_SECRET_LEN: usize = 32;
/// Sessions may live between one minute and one year.
const TTL_MINUTES_RANGE: std::ops::RangeInclusive<i64> = 1..=60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub session: SessionConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}/{}",
                lookup("DB_USER").unwrap_or_else(|| "postgres".into()),
                lookup("DB_PASSWORD").unwrap_or_default(),
                lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
                lookup("DB_NAME").unwrap_or_else(|| "expense_tracker".into()),
            ),
        };

        let secret = lookup("SESSION_SECRET").context("SESSION_SECRET must be set")?;
        if secret.len() < MIN_SECRET_LEN {
            bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }

        let ttl_minutes = parse_or(&lookup, "SESSION_TTL_MINUTES", 60)?;
        if !TTL_MINUTES_RANGE.contains(&ttl_minutes) {
            bail!(
                "SESSION_TTL_MINUTES must be between {} and {}, got {ttl_minutes}",
                TTL_MINUTES_RANGE.start(),
                TTL_MINUTES_RANGE.end()
            );
        }

        let session = SessionConfig {
            secret,
            ttl_minutes,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
        };

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            session,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 5001)?,
        })
    }

    pub fn session_ttl(&self) -> time::Duration {
        time::Duration::minutes(self.session.ttl_minutes)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
