use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

use chrono::Duration;

use crate::models::MimeLabel;
use crate::services::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Longest idle time a session may be kept: one year
const MAX_IDLE_MINUTES: i64 = 365 * 24 * 60;

/// Process-wide settings, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_max_tokens: Option<u32>,
    pub mime_label: MimeLabel,
    pub bind_addr: String,
    pub session_secret: Vec<u8>,
    pub session_idle: Duration,
    pub session_limit: usize,
    pub max_upload_bytes: usize,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = var("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            log::warn!("⚠️ OPENAI_API_KEY not set, every analysis will fail until it is configured");
        }

        let session_secret = match var("SESSION_SECRET") {
            Some(secret) => secret.into_bytes(),
            None => {
                log::warn!("⚠️ SESSION_SECRET not set, sessions will not survive a restart");
                let mut secret = uuid::Uuid::new_v4().as_bytes().to_vec();
                secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
                secret
            }
        };

        let max_upload_mb: usize = parse_or(var("MAX_UPLOAD_MB"), "MAX_UPLOAD_MB", 20)?;
        if max_upload_mb == 0 {
            anyhow::bail!("MAX_UPLOAD_MB must be at least 1");
        }
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("MAX_UPLOAD_MB {} is too large", max_upload_mb))?;

        let idle_minutes: i64 = parse_or(var("SESSION_IDLE_MINUTES"), "SESSION_IDLE_MINUTES", 60)?;
        if !(1..=MAX_IDLE_MINUTES).contains(&idle_minutes) {
            anyhow::bail!(
                "SESSION_IDLE_MINUTES must be between 1 and {}, got {}",
                MAX_IDLE_MINUTES,
                idle_minutes
            );
        }

        let session_limit: usize = parse_or(var("SESSION_LIMIT"), "SESSION_LIMIT", 1000)?;
        if session_limit == 0 {
            anyhow::bail!("SESSION_LIMIT must be at least 1");
        }

        Ok(Self {
            openai_api_key,
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            openai_max_tokens: var("OPENAI_MAX_TOKENS")
                .map(|v| v.trim().parse::<u32>().context("OPENAI_MAX_TOKENS must be a positive integer"))
                .transpose()?,
            mime_label: parse_or(var("IMAGE_MIME_LABEL"), "IMAGE_MIME_LABEL", MimeLabel::Jpeg)?,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            session_secret,
            session_idle: Duration::minutes(idle_minutes),
            session_limit,
            max_upload_bytes,
            static_dir: var("STATIC_DIR").unwrap_or_else(|| "static".to_string()),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {} '{}': {}", key, v, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.openai_max_tokens, None);
        assert_eq!(config.mime_label, MimeLabel::Jpeg);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.session_idle, Duration::minutes(60));
        assert_eq!(config.session_limit, 1000);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.session_secret.len(), 32);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_MAX_TOKENS", "500"),
            ("IMAGE_MIME_LABEL", "declared"),
            ("SESSION_SECRET", "s3cret"),
            ("MAX_UPLOAD_MB", "5"),
            ("SESSION_IDLE_MINUTES", "15"),
            ("SESSION_LIMIT", "50"),
        ])
        .unwrap();

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_max_tokens, Some(500));
        assert_eq!(config.mime_label, MimeLabel::Declared);
        assert_eq!(config.session_secret, b"s3cret".to_vec());
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.session_idle, Duration::minutes(15));
        assert_eq!(config.session_limit, 50);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config(&[("OPENAI_API_KEY", "  ")]).unwrap();
        assert_eq!(config.openai_api_key, None);
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(config(&[("MAX_UPLOAD_MB", "lots")]).is_err());
        assert!(config(&[("OPENAI_MAX_TOKENS", "-1")]).is_err());
        assert!(config(&[("IMAGE_MIME_LABEL", "gif")]).is_err());
    }

    #[test]
    fn test_idle_minutes_out_of_range_rejected() {
        assert!(config(&[("SESSION_IDLE_MINUTES", "0")]).is_err());
        assert!(config(&[("SESSION_IDLE_MINUTES", "-5")]).is_err());
        assert!(config(&[("SESSION_IDLE_MINUTES", "1000000000000")]).is_err());
        assert!(config(&[("SESSION_IDLE_MINUTES", "525600")]).is_ok());
    }

    #[test]
    fn test_upload_size_overflow_rejected() {
        let huge = usize::MAX.to_string();
        let err = config(&[("MAX_UPLOAD_MB", huge.as_str())]).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(config(&[("MAX_UPLOAD_MB", "0")]).is_err());
    }

    #[test]
    fn test_session_limit_must_be_positive() {
        assert!(config(&[("SESSION_LIMIT", "0")]).is_err());
        assert!(config(&[("SESSION_LIMIT", "-1")]).is_err());
    }
}
