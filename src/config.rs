use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, Context};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(anyhow!("unknown environment {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub session_service_url: String,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_api_url: String,
    pub from_email: String,
    pub frontend_url: String,
    pub environment: Environment,
}

impl Config {
    /// Reads `.env` (when present) and the process environment.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            info!("No .env file loaded: {e}");
        }

        Ok(Self {
            port: try_load("PORT", "8000")?,
            database_url: try_load("DATABASE_URL", "sqlite://meetup.db")?,
            session_service_url: try_load(
                "SESSION_SERVICE_URL",
                "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data",
            )?,
            sendgrid_api_key: optional("SENDGRID_API_KEY"),
            sendgrid_api_url: try_load("SENDGRID_API_URL", "https://api.sendgrid.com/v3/mail/send")?,
            from_email: try_load("SENDGRID_FROM_EMAIL", "no-reply@meetup.local")?,
            frontend_url: try_load("FRONTEND_URL", "http://localhost:3000")?,
            environment: try_load("ENVIRONMENT", "development")?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn optional(key: &str) -> Option<String> {
    match dotenv::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_owned()),
        _ => {
            warn!("{key} not set");
            None
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = dotenv::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });

    raw.parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value {raw:?}"))
}
