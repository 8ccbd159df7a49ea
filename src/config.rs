use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: u64,
    pub refresh_ttl_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let max_connections = env_parse("DB_MAX_CONNECTIONS").unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bazaar".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bazaar-users".into()),
            ttl_minutes: ttl_minutes("JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: ttl_minutes("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };
        Ok(Self {
            database_url,
            max_connections,
            jwt,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Token lifetimes must be a positive number of minutes when set.
fn ttl_minutes(key: &str, default: u64) -> anyhow::Result<u64> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => anyhow::bail!("{key} must be a positive number of minutes, got {raw:?}"),
    }
}
