//! File-based configuration loading tests.

use std::io::Write;

use http::StatusCode;
use tempfile::{Builder, NamedTempFile};
use turnstile_config::{ConfigError, ConfigLoader, LogFormat};

fn temp_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_complete_toml_file() {
    let file = temp_config(
        ".toml",
        r#"
            [processor]
            error_endpoint = "endpoint.Fallback"
            default_endpoint = "endpoint.Proxy"
            default_error_status = 502
            disabled_filters = ["pre.Debug", "post.Gzip"]

            [logging]
            enabled = true
            level = "turnstile_filter=debug,info"
            format = "pretty"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();

    assert_eq!(config.processor.error_endpoint, "endpoint.Fallback");
    assert_eq!(config.logging.format, LogFormat::Pretty);

    let processor = config.processor_config().unwrap();
    assert_eq!(processor.default_error_status, StatusCode::BAD_GATEWAY);
    assert!(processor.is_disabled("post.Gzip"));
    assert!(!processor.is_disabled("endpoint.Proxy"));
}

#[test]
fn test_json_file() {
    let file = temp_config(".json", r#"{"logging": {"level": "warn"}}"#);

    let config = ConfigLoader::new()
        .with_optional_file(file.path())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.processor.default_error_status, 500);
}

#[test]
fn test_unknown_field_in_file_is_rejected() {
    let file = temp_config(".toml", "[processor]\nretries = 3\n");

    let result = ConfigLoader::new().with_file(file.path());

    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_unsupported_extension() {
    let file = temp_config(".yaml", "processor: {}\n");

    let result = ConfigLoader::new().with_file(file.path());

    assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
}

#[test]
fn test_invalid_file_values_fail_validation() {
    let file = temp_config(
        ".toml",
        "[processor]\ndisabled_filters = [\"endpoint.ErrorResponse\"]\n",
    );

    let result = ConfigLoader::new().with_file(file.path()).unwrap().load();

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
