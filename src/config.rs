//! Runtime configuration loaded from environment variables.
//!
//! Every knob falls back to its default when the variable is missing or does
//! not parse; only inconsistent combinations are errors.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::error::ErrorCode;
use crate::sync::debounce::DebounceTiming;
use crate::sync::detect::DEFAULT_EPSILON;

pub const DEFAULT_PROJECT_ID: &str = "1";

const DEFAULT_SCENE_QUIET_MS: u64 = 10;
const DEFAULT_SCENE_MAX_WAIT_MS: u64 = 50;
const DEFAULT_EDITOR_QUIET_MS: u64 = 10;
const DEFAULT_EDITOR_MAX_WAIT_MS: u64 = 50;
const DEFAULT_CAMERA_QUIET_MS: u64 = 100;
const DEFAULT_CAMERA_MAX_WAIT_MS: u64 = 200;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{domain}: max wait {max_wait_ms}ms is shorter than quiet delay {quiet_ms}ms")]
    MaxWaitBelowQuiet { domain: &'static str, quiet_ms: u64, max_wait_ms: u64 },
    #[error("sync epsilon must be finite and non-negative")]
    InvalidEpsilon,
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MaxWaitBelowQuiet { .. } => "E_CONFIG_MAX_WAIT",
            Self::InvalidEpsilon => "E_CONFIG_EPSILON",
        }
    }
}

/// Debounce timings for the three live domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTimings {
    pub scene: DebounceTiming,
    pub editor: DebounceTiming,
    pub camera: DebounceTiming,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self { scene: DebounceTiming::SCENE, editor: DebounceTiming::EDITOR, camera: DebounceTiming::CAMERA }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Required by the binary; libraries embedding the engine may not need it.
    pub database_url: Option<String>,
    pub project_id: String,
    pub timings: SyncTimings,
    pub epsilon: f64,
    pub provision_project: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            project_id: DEFAULT_PROJECT_ID.to_string(),
            timings: SyncTimings::default(),
            epsilon: DEFAULT_EPSILON,
            provision_project: false,
        }
    }
}

impl SyncConfig {
    /// Load from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a domain's max wait is below its quiet
    /// delay or the epsilon is unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timings = SyncTimings {
            scene: timing_from_env("scene", "SCENE", DEFAULT_SCENE_QUIET_MS, DEFAULT_SCENE_MAX_WAIT_MS)?,
            editor: timing_from_env("editor", "EDITOR", DEFAULT_EDITOR_QUIET_MS, DEFAULT_EDITOR_MAX_WAIT_MS)?,
            camera: timing_from_env("camera", "CAMERA", DEFAULT_CAMERA_QUIET_MS, DEFAULT_CAMERA_MAX_WAIT_MS)?,
        };

        let epsilon = env_parse("SYNC_EPSILON", DEFAULT_EPSILON);
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(ConfigError::InvalidEpsilon);
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            project_id: std::env::var("PROJECT_ID").unwrap_or_else(|_| DEFAULT_PROJECT_ID.to_string()),
            timings,
            epsilon,
            provision_project: env_parse("PROVISION_PROJECT", false),
        })
    }
}

fn timing_from_env(
    domain: &'static str,
    prefix: &str,
    default_quiet_ms: u64,
    default_max_wait_ms: u64,
) -> Result<DebounceTiming, ConfigError> {
    let quiet_ms = env_parse(&format!("{prefix}_QUIET_MS"), default_quiet_ms);
    let max_wait_ms = env_parse(&format!("{prefix}_MAX_WAIT_MS"), default_max_wait_ms);
    if max_wait_ms < quiet_ms {
        return Err(ConfigError::MaxWaitBelowQuiet { domain, quiet_ms, max_wait_ms });
    }
    Ok(DebounceTiming::from_millis(quiet_ms, max_wait_ms))
}

/// Parse `key` from the environment, falling back to `default` when it is
/// missing or invalid.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
