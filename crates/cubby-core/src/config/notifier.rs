//! Reminder scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound for `cooldown_hours`, one year.
pub const MAX_COOLDOWN_HOURS: u64 = 24 * 365;

/// Settings for the periodic due-reminder scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Whether the scheduler is started with the process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between two ticks of the scheduler.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
    /// A (tracker, user) pair notified within this many hours is not
    /// notified again.
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: u64,
    /// Deadline for a single pass, in seconds.
    #[serde(default = "default_pass_timeout")]
    pub pass_timeout_seconds: u64,
    /// Maximum number of passes allowed in flight at once. Ticks that
    /// find no free slot are skipped.
    #[serde(default = "default_max_concurrent_passes")]
    pub max_concurrent_passes: usize,
    /// How long shutdown waits for in-flight passes, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl NotifierConfig {
    /// Reject settings the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tick_interval_seconds == 0 {
            return Err(AppError::configuration(
                "notifier.tick_interval_seconds must be greater than 0",
            ));
        }
        if self.pass_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "notifier.pass_timeout_seconds must be greater than 0",
            ));
        }
        if self.cooldown_hours == 0 || self.cooldown_hours > MAX_COOLDOWN_HOURS {
            return Err(AppError::configuration(format!(
                "notifier.cooldown_hours must be between 1 and {MAX_COOLDOWN_HOURS}, got {}",
                self.cooldown_hours
            )));
        }
        if self.max_concurrent_passes == 0 {
            return Err(AppError::configuration(
                "notifier.max_concurrent_passes must be at least 1",
            ));
        }
        Ok(())
    }

    /// Tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    /// Cooldown window as a [`chrono::Duration`], capped at
    /// [`MAX_COOLDOWN_HOURS`].
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cooldown_hours.min(MAX_COOLDOWN_HOURS) as i64)
    }

    /// Pass deadline as a [`Duration`].
    pub fn pass_timeout(&self) -> Duration {
        Duration::from_secs(self.pass_timeout_seconds)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            tick_interval_seconds: default_tick_interval(),
            cooldown_hours: default_cooldown_hours(),
            pass_timeout_seconds: default_pass_timeout(),
            max_concurrent_passes: default_max_concurrent_passes(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    30
}

fn default_cooldown_hours() -> u64 {
    6
}

fn default_pass_timeout() -> u64 {
    10
}

fn default_max_concurrent_passes() -> usize {
    1
}

fn default_shutdown_timeout() -> u64 {
    30
}
