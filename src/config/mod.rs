//! Runtime settings for the HTTP service.
//!
//! Built by `main` from CLI flags and environment variables; tests use
//! [`ServerConfig::default`] and override what they need.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::time::Duration;

use crate::consts::{
    DEFAULT_AI_TIMEOUT_SECS, DEFAULT_BODY_LIMIT, DEFAULT_OFFICIAL_EMAIL, DEFAULT_RATE_LIMIT,
    DEFAULT_RATE_WINDOW_SECS,
};

/// How request counts age out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// One counter per client, reset when its window elapses.
    Fixed,
    /// Count only requests inside the trailing window.
    Sliding,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    pub policy: WindowPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT,
            window: Duration::from_secs(DEFAULT_RATE_WINDOW_SECS),
            policy: WindowPolicy::Fixed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub official_email: String,
    pub body_limit: usize,
    /// `None` waits on the AI service indefinitely.
    pub ai_timeout: Option<Duration>,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            official_email: DEFAULT_OFFICIAL_EMAIL.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
            ai_timeout: Some(Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS)),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reject settings that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.official_email.trim().is_empty() {
            bail!("official email must not be empty");
        }
        if self.body_limit == 0 {
            bail!("body limit must be greater than zero");
        }
        if self.rate_limit.max_requests == 0 {
            bail!("rate limit must allow at least one request");
        }
        if self.rate_limit.window.is_zero() {
            bail!("rate limit window must be greater than zero");
        }
        Ok(())
    }
}

/// Load `KEY=value` lines from `path` into the process environment.
///
/// Variables already set are left alone. Returns `false` when the file
/// does not exist.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.rate_limit.policy, WindowPolicy::Fixed);
        assert_eq!(config.ai_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_rate_limit_rejected() {
        let mut config = ServerConfig::default();
        config.rate_limit.max_requests = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn zero_window_rejected() {
        let mut config = ServerConfig::default();
        config.rate_limit.window = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_body_limit_rejected() {
        let config = ServerConfig {
            body_limit: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_email_rejected() {
        let config = ServerConfig {
            official_email: "  ".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_env_file_is_not_an_error() {
        let path = std::env::temp_dir().join("bfhl-no-such-dir").join(".env");
        assert!(!load_env_file(path).unwrap());
    }

    #[test]
    fn env_file_sets_unset_variables() {
        let dir = std::env::temp_dir().join(format!("bfhl-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, "BFHL_ENV_FILE_MARKER=loaded\n").unwrap();

        assert!(load_env_file(&path).unwrap());
        assert_eq!(std::env::var("BFHL_ENV_FILE_MARKER").unwrap(), "loaded");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_env_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("bfhl-env-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, "NOT A VALID LINE\n").unwrap();

        let err = load_env_file(&path).unwrap_err();
        assert!(err.to_string().contains("failed to load"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
