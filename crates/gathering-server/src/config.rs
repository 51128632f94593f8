use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use tracing::info;

use gathering_engine::EngineConfig;
use gathering_engine::config::DEFAULT_MAX_ROLE_SLOTS;

const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("GATHERING_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("GATHERING_JWT_SECRET is unset or still a placeholder");
        }

        let max_role_slots = try_load(&lookup, "GATHERING_MAX_ROLE_SLOTS", DEFAULT_MAX_ROLE_SLOTS)?;
        if max_role_slots == 0 {
            bail!("GATHERING_MAX_ROLE_SLOTS must be at least 1");
        }

        Ok(Self {
            host: try_load(&lookup, "GATHERING_HOST", "0.0.0.0".to_string())?,
            port: try_load(&lookup, "GATHERING_PORT", 3000)?,
            db_path: PathBuf::from(try_load(
                &lookup,
                "GATHERING_DB_PATH",
                "gathering.db".to_string(),
            )?),
            jwt_secret,
            engine: EngineConfig { max_role_slots },
        })
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid {key} value '{raw}'")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
