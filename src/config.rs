use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_REFRESH_WAIT: Duration = Duration::from_secs(10);
const DEFAULT_GRANT_DURATION_DAYS: u64 = 10;

/// Coordinator tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Upper bound a decrypt waits for an in-flight refresh to settle before
    /// proceeding regardless.
    pub refresh_wait_timeout: Duration,
    /// Validity window of freshly signed decryption grants.
    pub grant_duration_days: u64,
    /// Refresh the caller's own total right after a wallet connects.
    pub auto_refresh_total: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            refresh_wait_timeout: DEFAULT_REFRESH_WAIT,
            grant_duration_days: DEFAULT_GRANT_DURATION_DAYS,
            auto_refresh_total: true,
        }
    }
}

impl CoordinatorConfig {
    /// Defaults overlaid with `NEBULA_*` environment variables (a `.env`
    /// file is honored if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(raw) = env::var("NEBULA_REFRESH_WAIT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => config.refresh_wait_timeout = Duration::from_millis(ms),
                Err(_) => warn!("ignoring invalid NEBULA_REFRESH_WAIT_MS value: {}", raw),
            }
        }
        if let Ok(raw) = env::var("NEBULA_GRANT_DURATION_DAYS") {
            match raw.parse::<u64>() {
                Ok(days) => config.grant_duration_days = days,
                Err(_) => warn!("ignoring invalid NEBULA_GRANT_DURATION_DAYS value: {}", raw),
            }
        }
        if let Ok(raw) = env::var("NEBULA_AUTO_REFRESH") {
            config.auto_refresh_total = raw != "0" && !raw.eq_ignore_ascii_case("false");
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.refresh_wait_timeout, Duration::from_secs(10));
        assert_eq!(config.grant_duration_days, 10);
        assert!(config.auto_refresh_total);
    }

    #[test]
    fn test_from_env_overrides() {
        // SAFETY: test-local variables, no other thread reads them.
        unsafe {
            env::set_var("NEBULA_REFRESH_WAIT_MS", "2500");
            env::set_var("NEBULA_GRANT_DURATION_DAYS", "3");
            env::set_var("NEBULA_AUTO_REFRESH", "false");
        }
        let config = CoordinatorConfig::from_env();
        assert_eq!(config.refresh_wait_timeout, Duration::from_millis(2500));
        assert_eq!(config.grant_duration_days, 3);
        assert!(!config.auto_refresh_total);
        unsafe {
            env::remove_var("NEBULA_REFRESH_WAIT_MS");
            env::remove_var("NEBULA_GRANT_DURATION_DAYS");
            env::remove_var("NEBULA_AUTO_REFRESH");
        }
    }
}
