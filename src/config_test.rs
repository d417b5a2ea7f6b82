use super::*;
use std::time::Duration;

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: u64 = env_parse("__TEST_SCENESYNC_NONEXISTENT__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__TEST_SCENESYNC_VALID__", " 99 ") };
    let val: u64 = env_parse("__TEST_SCENESYNC_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__TEST_SCENESYNC_VALID__") };
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__TEST_SCENESYNC_INVALID__", "notanumber") };
    let val: u64 = env_parse("__TEST_SCENESYNC_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__TEST_SCENESYNC_INVALID__") };
}

#[test]
fn env_parse_bool_flag() {
    unsafe { std::env::set_var("__TEST_SCENESYNC_FLAG__", "true") };
    assert!(env_parse("__TEST_SCENESYNC_FLAG__", false));
    unsafe { std::env::remove_var("__TEST_SCENESYNC_FLAG__") };
}

// =============================================================================
// timings
// =============================================================================

#[test]
fn default_timings_match_domain_constants() {
    let timings = SyncTimings::default();
    assert_eq!(timings.scene.quiet, Duration::from_millis(10));
    assert_eq!(timings.scene.max_wait, Duration::from_millis(50));
    assert_eq!(timings.editor, DebounceTiming::EDITOR);
    assert_eq!(timings.camera.quiet, Duration::from_millis(100));
    assert_eq!(timings.camera.max_wait, Duration::from_millis(200));
}

#[test]
fn timing_override_is_applied() {
    unsafe {
        std::env::set_var("__TSS_A_QUIET_MS", "20");
        std::env::set_var("__TSS_A_MAX_WAIT_MS", "80");
    }
    let timing = timing_from_env("a", "__TSS_A", 1, 2).unwrap();
    assert_eq!(timing, DebounceTiming::from_millis(20, 80));
    unsafe {
        std::env::remove_var("__TSS_A_QUIET_MS");
        std::env::remove_var("__TSS_A_MAX_WAIT_MS");
    }
}

#[test]
fn max_wait_below_quiet_is_rejected() {
    unsafe {
        std::env::set_var("__TSS_B_QUIET_MS", "100");
        std::env::set_var("__TSS_B_MAX_WAIT_MS", "10");
    }
    let err = timing_from_env("b", "__TSS_B", 1, 2).unwrap_err();
    assert_eq!(err, ConfigError::MaxWaitBelowQuiet { domain: "b", quiet_ms: 100, max_wait_ms: 10 });
    assert_eq!(err.error_code(), "E_CONFIG_MAX_WAIT");
    unsafe {
        std::env::remove_var("__TSS_B_QUIET_MS");
        std::env::remove_var("__TSS_B_MAX_WAIT_MS");
    }
}

#[test]
fn default_config_uses_project_one() {
    let config = SyncConfig::default();
    assert_eq!(config.project_id, "1");
    assert!(!config.provision_project);
    assert!((config.epsilon - 1e-9).abs() < f64::EPSILON);
}
