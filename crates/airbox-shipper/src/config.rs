// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shipper configuration.
//!
//! The configuration is read once at startup from a YAML file and may be
//! overridden key by key with `AIRBOX_`-prefixed environment variables:
//!
//! ```yaml
//! path_pattern: "/var/spool/airbox/*.json"
//! max_files: 50
//! api_endpoint: "https://api.example.com/v1/readings"
//! api_token: "..."
//! server_key: "..."
//! check_interval: 30s
//! ```
//!
//! The loaded [`Config`] is immutable and shared read-only with every cycle.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::error;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/airbox/shipper.yml";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const ENV_PREFIX: &str = "AIRBOX_";

#[derive(Clone, PartialEq)]
pub struct Config {
    /// Glob pattern used to discover files to ship.
    pub path_pattern: String,
    /// Upper bound on the number of files in one batch.
    pub max_files: usize,
    pub api_endpoint: String,
    pub api_token: String,
    pub server_key: String,
    /// Time between two cycles.
    pub check_interval: Duration,
    /// Bound on a single delivery request.
    pub request_timeout: Duration,
    pub https_proxy: Option<String>,
    pub log_level: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path_pattern", &self.path_pattern)
            .field("max_files", &self.max_files)
            .field("api_endpoint", &self.api_endpoint)
            .field("api_token", &"<redacted>")
            .field("server_key", &"<redacted>")
            .field("check_interval", &self.check_interval)
            .field("request_timeout", &self.request_timeout)
            .field("https_proxy", &self.https_proxy)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Raw shape of the configuration file, before validation.
#[derive(Debug, PartialEq, Deserialize, Clone, Default)]
#[serde(default)]
struct FileConfig {
    #[serde(deserialize_with = "deserialize_string_or_int")]
    path_pattern: Option<String>,
    max_files: Option<u64>,
    #[serde(deserialize_with = "deserialize_string_or_int")]
    api_endpoint: Option<String>,
    #[serde(deserialize_with = "deserialize_string_or_int")]
    api_token: Option<String>,
    #[serde(deserialize_with = "deserialize_string_or_int")]
    server_key: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_duration")]
    check_interval: Option<Duration>,
    #[serde(deserialize_with = "deserialize_optional_duration")]
    request_timeout: Option<Duration>,
    #[serde(deserialize_with = "deserialize_string_or_int")]
    https_proxy: Option<String>,
    #[serde(deserialize_with = "deserialize_string_or_int")]
    log_level: Option<String>,
}

impl Config {
    /// Reads the YAML file at `path`, applies environment overrides and validates the result.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let figment = Figment::new()
            .merge(Yaml::string(&contents))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]));

        Config::from_figment(&figment)
    }

    fn from_figment(figment: &Figment) -> Result<Config, ConfigError> {
        let raw = figment
            .extract::<FileConfig>()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Config::try_from(raw)
    }
}

impl TryFrom<FileConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: FileConfig) -> Result<Self, Self::Error> {
        let path_pattern = required_string(raw.path_pattern, "path_pattern")?;
        let api_endpoint = required_string(raw.api_endpoint, "api_endpoint")?;
        let api_token = required_string(raw.api_token, "api_token")?;
        let server_key = required_string(raw.server_key, "server_key")?;

        let max_files = match raw.max_files {
            None => return Err(missing("max_files")),
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "max_files must be greater than 0".to_string(),
                ))
            }
            Some(n) => usize::try_from(n).map_err(|_| {
                ConfigError::Invalid(format!("max_files is too large: {n}"))
            })?,
        };

        let check_interval = match raw.check_interval {
            None => return Err(missing("check_interval")),
            Some(d) if d.is_zero() => {
                return Err(ConfigError::Invalid(
                    "check_interval must be greater than 0".to_string(),
                ))
            }
            Some(d) => d,
        };

        let request_timeout = match raw.request_timeout {
            Some(d) if d.is_zero() => {
                return Err(ConfigError::Invalid(
                    "request_timeout must be greater than 0".to_string(),
                ))
            }
            Some(d) => d,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        match reqwest::Url::parse(&api_endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::Invalid(format!(
                    "api_endpoint must use http or https, got '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(ConfigError::Invalid(format!(
                    "api_endpoint '{api_endpoint}' is not a valid URL: {e}"
                )))
            }
        }

        Ok(Config {
            path_pattern,
            max_files,
            api_endpoint,
            api_token,
            server_key,
            check_interval,
            request_timeout,
            https_proxy: raw.https_proxy.filter(|p| !p.trim().is_empty()),
            log_level: raw
                .log_level
                .map(|l| l.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::Invalid(format!("{field} is required"))
}

fn required_string(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ConfigError::Invalid(format!("{field} must not be empty"))),
        None => Err(missing(field)),
    }
}

/// Environment overrides turn numeric-looking secrets into numbers, so strings are taken from
/// either representation.
fn deserialize_string_or_int<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got: {other}"
        ))),
    }
}

fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => parse_duration(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => n
                .as_f64()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .map(Some)
                .ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid duration in seconds: {n}"))
                }),
        },
        Some(Value::Null) | None => Ok(None),
        Some(other) => {
            error!("Failed to parse duration, got: {}", other);
            Err(serde::de::Error::custom(format!(
                "expected a duration, got: {other}"
            )))
        }
    }
}

/// Parses durations written as `10s`, `1m30s`, `1.5h` or `250ms`. A bare integer is a
/// number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_end == 0 {
            return Err(format!("invalid duration '{raw}'"));
        }
        let value: f64 = rest[..number_end]
            .parse()
            .map_err(|_| format!("invalid duration '{raw}'"))?;

        let after = &rest[number_end..];
        let unit_end = after.find(is_number).unwrap_or(after.len());
        let seconds_per_unit = match &after[..unit_end] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => return Err(format!("missing unit in duration '{raw}'")),
            unit => return Err(format!("unknown unit '{unit}' in duration '{raw}'")),
        };

        let part = Duration::try_from_secs_f64(value * seconds_per_unit)
            .map_err(|e| format!("invalid duration '{raw}': {e}"))?;
        total = total
            .checked_add(part)
            .ok_or_else(|| format!("duration '{raw}' overflows"))?;
        rest = &after[unit_end..];
    }

    Ok(total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
path_pattern: "test/*.json"
max_files: 5
api_endpoint: "http://localhost:8080/test"
api_token: "test_token"
server_key: "test_server_key"
check_interval: 10s
"#;

    #[test]
    fn test_load_config() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("shipper.yml", FULL_CONFIG)?;

            let config = Config::load(Path::new("shipper.yml")).map_err(|e| e.to_string())?;
            assert_eq!(config.path_pattern, "test/*.json");
            assert_eq!(config.max_files, 5);
            assert_eq!(config.api_endpoint, "http://localhost:8080/test");
            assert_eq!(config.api_token, "test_token");
            assert_eq!(config.server_key, "test_server_key");
            assert_eq!(config.check_interval, Duration::from_secs(10));
            assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
            assert_eq!(config.https_proxy, None);
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("shipper.yml", FULL_CONFIG)?;
            jail.set_env("AIRBOX_API_TOKEN", "12345");
            jail.set_env("AIRBOX_MAX_FILES", "20");
            jail.set_env("AIRBOX_CHECK_INTERVAL", "1m30s");
            jail.set_env("AIRBOX_LOG_LEVEL", "DEBUG");

            let config = Config::load(Path::new("shipper.yml")).map_err(|e| e.to_string())?;
            assert_eq!(config.api_token, "12345");
            assert_eq!(config.max_files, 20);
            assert_eq!(config.check_interval, Duration::from_secs(90));
            assert_eq!(config.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_config_path_variable_is_not_a_key() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("shipper.yml", FULL_CONFIG)?;
            jail.set_env("AIRBOX_CONFIG", "/somewhere/else.yml");

            assert!(Config::load(Path::new("shipper.yml")).is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_optional_fields() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "shipper.yml",
                &format!("{FULL_CONFIG}request_timeout: 5\nhttps_proxy: \"http://proxy:3128\"\n"),
            )?;

            let config = Config::load(Path::new("shipper.yml")).map_err(|e| e.to_string())?;
            assert_eq!(config.request_timeout, Duration::from_secs(5));
            assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();

            let err = Config::load(Path::new("does-not-exist.yml")).unwrap_err();
            assert!(matches!(err, ConfigError::Read { .. }));
            Ok(())
        });
    }

    #[test]
    fn test_unparsable_file_is_a_parse_error() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("shipper.yml", "max_files: [1, 2\n")?;

            let err = Config::load(Path::new("shipper.yml")).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)));
            Ok(())
        });
    }

    #[test]
    fn test_bad_duration_is_a_parse_error() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "shipper.yml",
                &FULL_CONFIG.replace("check_interval: 10s", "check_interval: soon"),
            )?;

            let err = Config::load(Path::new("shipper.yml")).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)));
            Ok(())
        });
    }

    #[test]
    fn test_overflowing_duration_is_a_parse_error() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("shipper.yml", FULL_CONFIG)?;
            jail.set_env(
                "AIRBOX_REQUEST_TIMEOUT",
                "10000000000000000000s10000000000000000000s",
            );

            let err = Config::load(Path::new("shipper.yml")).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)));
            Ok(())
        });
    }

    #[test]
    fn test_missing_field_is_invalid() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "shipper.yml",
                &FULL_CONFIG.replace("server_key: \"test_server_key\"", ""),
            )?;

            let err = Config::load(Path::new("shipper.yml")).unwrap_err();
            assert_eq!(err.to_string(), "Invalid configuration: server_key is required");
            Ok(())
        });
    }

    #[test]
    fn test_zero_max_files_is_invalid() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "shipper.yml",
                &FULL_CONFIG.replace("max_files: 5", "max_files: 0"),
            )?;

            let err = Config::load(Path::new("shipper.yml")).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_endpoint_must_be_http() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "shipper.yml",
                &FULL_CONFIG.replace("http://localhost:8080/test", "ftp://localhost/test"),
            )?;

            let err = Config::load(Path::new("shipper.yml")).unwrap_err();
            assert!(err.to_string().contains("http or https"));
            Ok(())
        });
    }

    #[test]
    fn test_debug_redacts_secrets() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("shipper.yml", FULL_CONFIG)?;

            let config = Config::load(Path::new("shipper.yml")).map_err(|e| e.to_string())?;
            let rendered = format!("{config:?}");
            assert!(!rendered.contains("test_token"));
            assert!(!rendered.contains("test_server_key"));
            assert!(rendered.contains("test/*.json"));
            Ok(())
        });
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("100us").unwrap(), Duration::from_micros(100));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("1.2.3s").is_err());
        assert!(parse_duration("1m30").is_err());
        assert!(parse_duration("10000000000000000000s10000000000000000000s").is_err());
    }
}
