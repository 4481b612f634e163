//! Integration tests for configuration loading

use footfall::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[detector]
confidence_threshold = 0.5
skip_frames = 15
person_label = "person"

[tracker]
max_disappeared = 25
max_distance = 80.0

[alerts]
dwell_threshold_secs = 4
cooldown_secs = 8
entry_exit_threshold = 12

[notify]
webhook_url = "http://localhost:9000/alerts"
webhook_timeout_ms = 1500

[report]
count_log_file = "out/counting.csv"
history_capacity = 50
metrics_interval_secs = 5
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.confidence_threshold(), 0.5);
    assert_eq!(config.skip_frames(), 15);
    assert_eq!(config.max_disappeared(), 25);
    assert_eq!(config.max_distance(), 80.0);
    assert_eq!(config.dwell_threshold_secs(), 4);
    assert_eq!(config.cooldown_secs(), 8);
    assert_eq!(config.entry_exit_threshold(), 12);
    assert_eq!(config.webhook_url(), Some("http://localhost:9000/alerts"));
    assert_eq!(config.webhook_timeout_ms(), 1500);
    assert_eq!(config.count_log_file(), "out/counting.csv");
    assert_eq!(config.history_capacity(), 50);
    assert_eq!(config.metrics_interval_secs(), 5);
}

#[test]
fn test_missing_sections_fall_back_to_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(
            br#"
[tracker]
max_disappeared = 10
max_distance = 30.0
"#,
        )
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.max_disappeared(), 10);
    assert_eq!(config.confidence_threshold(), 0.4);
    assert_eq!(config.cooldown_secs(), 5);
    assert_eq!(config.person_label(), "person");
}

#[test]
fn test_missing_file_is_fatal() {
    assert!(Config::from_file("/nonexistent/footfall.toml").is_err());
}

#[test]
fn test_unparsable_file_is_fatal() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"this is { not toml").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_invalid_thresholds_are_fatal() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(
            br#"
[tracker]
max_disappeared = 0
max_distance = 50.0
"#,
        )
        .unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("max_disappeared"));
}

#[test]
fn test_out_of_range_confidence_is_fatal() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(
            br#"
[detector]
confidence_threshold = 1.5
"#,
        )
        .unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}
