use crate::error::{AppError, Result};
use crate::notification::{NotificationService, SweepHeartbeat};
use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notification_service: Arc<NotificationService>,
    pub heartbeat: SweepHeartbeat,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub email_webhook_url: Option<String>,
    pub email_timeout_secs: u64,
    pub send_window_minutes: i64,
    pub default_timezone: Tz,
    pub digest_send_hour: u32,
    pub sweep_cron: String,
    pub sweep_lookahead_hours: i64,
    pub sweep_stale_after_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_timezone = lookup("DEFAULT_TIMEZONE").unwrap_or_else(|| "UTC".to_string());
        let default_timezone = Tz::from_str(&default_timezone).map_err(|_| {
            AppError::Config(format!("DEFAULT_TIMEZONE '{}' is not an IANA zone", default_timezone))
        })?;

        let digest_send_hour: u32 = parse_or(&lookup, "DIGEST_SEND_HOUR", 20)?;
        if digest_send_hour > 23 {
            return Err(AppError::Config(format!(
                "DIGEST_SEND_HOUR must be between 0 and 23, got {}",
                digest_send_hour
            )));
        }

        let send_window_minutes: i64 = parse_in_range(&lookup, "REMINDER_SEND_WINDOW_MINUTES", 30, 0, 24 * 60)?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            email_webhook_url: lookup("EMAIL_WEBHOOK_URL").filter(|url| !url.trim().is_empty()),
            email_timeout_secs: parse_in_range(&lookup, "EMAIL_TIMEOUT_SECS", 10, 1, 300)?,
            send_window_minutes,
            default_timezone,
            digest_send_hour,
            sweep_cron: lookup("SWEEP_CRON").unwrap_or_else(|| "0 */5 * * * *".to_string()),
            sweep_lookahead_hours: parse_in_range(&lookup, "SWEEP_LOOKAHEAD_HOURS", 336, 1, 24 * 366 * 5)?,
            sweep_stale_after_minutes: parse_in_range(&lookup, "SWEEP_STALE_AFTER_MINUTES", 15, 1, 7 * 24 * 60)?,
        })
    }

    pub fn send_window(&self) -> Duration {
        Duration::minutes(self.send_window_minutes)
    }

    pub fn digest_send_time(&self) -> Result<NaiveTime> {
        NaiveTime::from_hms_opt(self.digest_send_hour, 0, 0)
            .ok_or_else(|| AppError::Config(format!("invalid DIGEST_SEND_HOUR {}", self.digest_send_hour)))
    }

    pub fn sweep_lookahead(&self) -> Duration {
        Duration::hours(self.sweep_lookahead_hours)
    }

    pub fn sweep_stale_after(&self) -> Duration {
        Duration::minutes(self.sweep_stale_after_minutes)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_in_range<F, T>(lookup: &F, key: &str, default: T, min: T, max: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + std::fmt::Display,
{
    let value = parse_or(lookup, key, default)?;
    if value < min || value > max {
        return Err(AppError::Config(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.send_window(), Duration::minutes(30));
        assert_eq!(config.default_timezone, chrono_tz::UTC);
        assert_eq!(config.digest_send_hour, 20);
        assert!(config.email_webhook_url.is_none());
        assert_eq!(config.sweep_cron, "0 */5 * * * *");
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("PORT", "8080"),
            ("DEFAULT_TIMEZONE", "America/Chicago"),
            ("DIGEST_SEND_HOUR", "19"),
            ("EMAIL_WEBHOOK_URL", "http://relay.local/send"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_timezone, chrono_tz::America::Chicago);
        assert_eq!(config.digest_send_hour, 19);
        assert_eq!(config.email_webhook_url.as_deref(), Some("http://relay.local/send"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config_with(&[("DEFAULT_TIMEZONE", "Mars/Olympus")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config_with(&[("DIGEST_SEND_HOUR", "24")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config_with(&[("PORT", "http")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        for (key, value) in [
            ("SWEEP_LOOKAHEAD_HOURS", "-1"),
            ("SWEEP_LOOKAHEAD_HOURS", "0"),
            ("SWEEP_LOOKAHEAD_HOURS", "9223372036854775807"),
            ("SWEEP_STALE_AFTER_MINUTES", "-5"),
            ("SWEEP_STALE_AFTER_MINUTES", "9223372036854775807"),
            ("EMAIL_TIMEOUT_SECS", "0"),
            ("REMINDER_SEND_WINDOW_MINUTES", "-1"),
            ("REMINDER_SEND_WINDOW_MINUTES", "100000000000000000"),
        ] {
            assert!(
                matches!(config_with(&[(key, value)]), Err(AppError::Config(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }

        let config = config_with(&[
            ("SWEEP_LOOKAHEAD_HOURS", "720"),
            ("SWEEP_STALE_AFTER_MINUTES", "60"),
            ("EMAIL_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.sweep_lookahead(), Duration::hours(720));
        assert_eq!(config.sweep_stale_after(), Duration::minutes(60));
        assert_eq!(config.email_timeout_secs, 30);
    }

    #[test]
    fn test_blank_webhook_is_ignored() {
        let config = config_with(&[("EMAIL_WEBHOOK_URL", "  ")]).unwrap();
        assert!(config.email_webhook_url.is_none());
    }
}
