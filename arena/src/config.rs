//! Arena configuration

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use quizpet_battle::BattleRules;
use serde::{Deserialize, Serialize};

/// Backoff applied to failed store writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 50,
            max_delay_ms: 1000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Delay to wait after `delay`, capped at `max_delay`
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let max = self.max_delay();
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier.max(1.0))
            .map_or(max, |next| next.min(max))
    }
}

/// Settings shared by every lobby of an [`Arena`](crate::Arena)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Time between two ticks of an active round
    pub tick_interval_ms: u64,

    /// An unready seat is removed after this long (`None` disables)
    pub idle_timeout_ms: Option<u64>,

    pub rules: BattleRules,

    pub retry: RetryPolicy,

    /// Seed for loadout generation and refresh; random when unset
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1500,
            idle_timeout_ms: Some(120_000),
            rules: BattleRules::default(),
            retry: RetryPolicy::default(),
            seed: None,
        }
    }
}

impl ArenaConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("Invalid arena config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Reject settings the lobby task cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be greater than zero");
        }
        if self.rules.max_health <= 0 {
            anyhow::bail!("rules.max_health must be positive");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if !self.retry.backoff_multiplier.is_finite() {
            anyhow::bail!("retry.backoff_multiplier must be finite");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArenaConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(1500));
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.rules.max_health, 120);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ArenaConfig::from_json_str(
            r#"{"tick_interval_ms": 500, "rules": {"max_rounds": 3}}"#,
        )
        .unwrap();

        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.rules.max_rounds, Some(3));
        assert_eq!(config.rules.max_health, 120);
        assert_eq!(config.idle_timeout_ms, Some(120_000));
    }

    #[test]
    fn test_null_disables_idle_timeout() {
        let config = ArenaConfig::from_json_str(r#"{"idle_timeout_ms": null}"#).unwrap();
        assert_eq!(config.idle_timeout(), None);
    }

    #[test]
    fn test_rejects_zero_tick_interval() {
        assert!(ArenaConfig::from_json_str(r#"{"tick_interval_ms": 0}"#).is_err());
        assert!(ArenaConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join("quizpet-arena-config-test.json");
        std::fs::write(&path, r#"{"seed": 7}"#).unwrap();

        let config = ArenaConfig::from_path(&path).unwrap();
        assert_eq!(config.seed, Some(7));

        std::fs::remove_file(&path).ok();
        assert!(ArenaConfig::from_path(&path).is_err());
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        let mut delay = policy.initial_delay();
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(delay.as_millis());
            delay = policy.next_delay(delay);
        }
        assert_eq!(seen, vec![50, 100, 200, 400, 800, 1000]);
    }

    #[test]
    fn test_overflowing_backoff_saturates() {
        let policy = RetryPolicy {
            backoff_multiplier: 1e20,
            ..RetryPolicy::default()
        };
        let mut delay = policy.initial_delay();
        for _ in 0..4 {
            delay = policy.next_delay(delay);
        }
        assert_eq!(delay, policy.max_delay());

        let unbounded = RetryPolicy {
            backoff_multiplier: f64::MAX,
            max_delay_ms: u64::MAX,
            ..RetryPolicy::default()
        };
        let delay = unbounded.next_delay(Duration::from_secs(u64::MAX / 2));
        assert_eq!(delay, unbounded.max_delay());
    }
}
