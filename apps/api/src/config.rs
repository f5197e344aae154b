use std::time::Duration;

use anyhow::{Context, Result};

use crate::workflow::session::AnalysisTiming;

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub analysis_delay_ms: u64,
    pub scoring_timeout_secs: u64,
    /// When set, analyses are scored by this service instead of the random placeholder.
    pub scoring_service_url: Option<String>,
    pub max_resume_bytes: usize,
    pub session_ttl_secs: u64,
    /// Browser origins allowed by CORS. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            analysis_delay_ms: parse_or(&lookup, "ANALYSIS_DELAY_MS", 3000)?,
            scoring_timeout_secs: parse_or(&lookup, "SCORING_TIMEOUT_SECS", 30)?,
            scoring_service_url: lookup("SCORING_SERVICE_URL").filter(|url| !url.trim().is_empty()),
            max_resume_bytes: parse_or(&lookup, "MAX_RESUME_BYTES", 10 * 1024 * 1024)?,
            session_ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", 3600)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn analysis_timing(&self) -> AnalysisTiming {
        AnalysisTiming {
            delay: Duration::from_millis(self.analysis_delay_ms),
            scoring_timeout: Duration::from_secs(self.scoring_timeout_secs),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
