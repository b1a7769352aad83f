//! Error type tests
//!
//! Tests for LibrarianError, its stage tags and conversions.

#![allow(clippy::expect_used)]

use crate::error::config::{
    invalid as config_invalid, not_found as config_not_found, parse_failed as config_parse_failed,
};
use crate::error::fs::{io_error, read_failed as file_read_failed};
use crate::error::index::not_found as release_not_found;
use crate::error::install::{
    fetch_failed, materialize_failed, prerequisite_failed, rescan_failed,
};
use crate::error::{ErrorKind, LibrarianError};
use miette::Diagnostic;

macro_rules! test_error_contains {
    ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
        #[test]
        fn $test_name() {
            let err = $err;
            let error_string = err.to_string();
            $(
                assert!(error_string.contains($contains),
                    "Error message should contain '{}', got: {}",
                    $contains,
                    error_string
                );
            )+
        }
    };
}

#[test]
fn test_error_display() {
    let err = release_not_found("Servo@^9");
    assert_eq!(
        err.to_string(),
        "No release of 'Servo@^9' found in the index"
    );
}

#[test]
fn test_error_code() {
    let err = release_not_found("Servo");
    assert_eq!(
        err.code()
            .map(|c: Box<dyn std::fmt::Display>| c.to_string()),
        Some("librarian::index::not_found".to_string())
    );
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: LibrarianError = io_err.into();
    assert!(matches!(err, LibrarianError::IoError { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_yaml_error_conversion() {
    let yaml_str = "invalid: yaml: content: [unclosed";
    let parse_result: std::result::Result<serde_yaml::Value, _> = serde_yaml::from_str(yaml_str);
    let yaml_err = parse_result.expect_err("YAML parsing should have failed");
    let err: LibrarianError = yaml_err.into();
    assert!(matches!(err, LibrarianError::ConfigParseFailed { .. }));
}

#[test]
fn test_json_error_conversion() {
    let parse_result: std::result::Result<serde_json::Value, _> =
        serde_json::from_str("invalid json content");
    let json_err = parse_result.expect_err("JSON parsing should have failed");
    let err: LibrarianError = json_err.into();
    assert!(matches!(err, LibrarianError::ConfigParseFailed { .. }));
}

test_error_contains!(
    test_prerequisite_failed_message,
    prerequisite_failed("Servo@1.1.0", "listing installed libraries", "catalog offline"),
    "Cannot install Servo@1.1.0",
    "listing installed libraries",
    "catalog offline"
);

test_error_contains!(
    test_fetch_failed_message,
    fetch_failed("Servo@1.1.0", "downloading file:///tmp/servo.zip", "No such file"),
    "Failed to fetch Servo@1.1.0",
    "downloading file:///tmp/servo.zip"
);

test_error_contains!(
    test_materialize_failed_message,
    materialize_failed("Servo@1.2.0", "swapping into /libs/Servo", "permission denied"),
    "Failed to install Servo@1.2.0",
    "swapping into /libs/Servo",
    "permission denied"
);

test_error_contains!(
    test_rescan_failed_message,
    rescan_failed("Servo@1.2.0", "libraries directory vanished"),
    "Installed Servo@1.2.0",
    "failed to rescan"
);

#[test]
fn test_stage_kinds() {
    assert_eq!(release_not_found("x").kind(), ErrorKind::NotFound);
    assert_eq!(
        prerequisite_failed("x", "a", "b").kind(),
        ErrorKind::Prerequisite
    );
    assert_eq!(fetch_failed("x", "a", "b").kind(), ErrorKind::Fetch);
    assert_eq!(
        materialize_failed("x", "a", "b").kind(),
        ErrorKind::Materialize
    );
    assert_eq!(rescan_failed("x", "b").kind(), ErrorKind::Rescan);
    assert_eq!(config_invalid("bad").kind(), ErrorKind::Config);
    assert_eq!(io_error("disk").kind(), ErrorKind::Io);
}

#[test]
fn test_config_not_found() {
    let err = config_not_found("/path/to/librarian.yaml");
    assert!(matches!(err, LibrarianError::ConfigNotFound { .. }));
    assert!(err.to_string().contains("Configuration file not found"));
}

#[test]
fn test_config_parse_failed() {
    let err = config_parse_failed("/path/to/index.yaml", "expected a sequence");
    assert!(matches!(err, LibrarianError::ConfigParseFailed { .. }));
    assert!(err.to_string().contains("expected a sequence"));
}

#[test]
fn test_file_read_failed() {
    let err = file_read_failed("/path/library.yaml", "permission denied");
    assert!(matches!(err, LibrarianError::FileReadFailed { .. }));
    assert!(err.to_string().contains("/path/library.yaml"));
}
