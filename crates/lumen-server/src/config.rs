use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = lookup("LUMEN_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LUMEN_JWT_SECRET is unset or still a placeholder");
        }

        let port = lookup("LUMEN_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("LUMEN_PORT must be a port number")?;
        let token_ttl_days = lookup("LUMEN_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("LUMEN_TOKEN_TTL_DAYS must be a whole number of days")?;

        Ok(Self {
            host: lookup("LUMEN_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: lookup("LUMEN_DB_PATH").unwrap_or_else(|| "lumen.db".into()).into(),
            jwt_secret,
            token_ttl_days,
        })
    }
}
