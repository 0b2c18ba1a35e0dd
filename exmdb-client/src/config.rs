//! Client configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via EXMDB_CONFIG)
//! 3. Environment variables

use crate::error::ConfigError;
use exmdb_protocol::{WStringEncoding, DEFAULT_HOST, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "EXMDB_CONFIG";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Default data area prefix used by `connect`.
    pub prefix: Option<String>,
    /// Default store mode used by `connect`.
    pub private: Option<bool>,
    /// Exchange wstrings as UTF-16LE instead of 8-bit strings.
    pub wstring_utf16: bool,
    /// Socket connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            prefix: None,
            private: None,
            wstring_utf16: false,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    pub fn with_wstring_encoding(mut self, encoding: WStringEncoding) -> Self {
        self.wstring_utf16 = encoding == WStringEncoding::Utf16;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = whole_secs(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = whole_secs(timeout);
        self
    }

    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: ClientConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Overrides fields from `EXMDB_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("EXMDB_HOST") {
            if !host.is_empty() {
                self.host = host;
            }
        }

        if let Some(port) = lookup("EXMDB_PORT") {
            if let Ok(parsed) = port.parse() {
                self.port = parsed;
            }
        }

        if let Some(prefix) = lookup("EXMDB_PREFIX") {
            self.prefix = Some(prefix);
        }

        if let Some(private) = lookup("EXMDB_PRIVATE") {
            self.private = Some(parse_flag(&private));
        }

        if let Some(utf16) = lookup("EXMDB_WSTRING_UTF16") {
            self.wstring_utf16 = parse_flag(&utf16);
        }

        if let Some(timeout) = lookup("EXMDB_CONNECT_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.connect_timeout_secs = secs;
            }
        }

        if let Some(timeout) = lookup("EXMDB_REQUEST_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    /// Rejects values that cannot produce a working connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue("host", "must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port", "must not be 0".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "connect_timeout_secs",
                "must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs",
                "must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Returns the `host:port` address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn wstring_encoding(&self) -> WStringEncoding {
        if self.wstring_utf16 {
            WStringEncoding::Utf16
        } else {
            WStringEncoding::Narrow
        }
    }
}

/// Rounds a timeout up to whole seconds, never below one.
fn whole_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs();
    if secs == 0 || timeout.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:5000");
        assert_eq!(config.prefix, None);
        assert_eq!(config.private, None);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.wstring_encoding(), WStringEncoding::Narrow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("mail.example.com", 5001)
            .with_prefix("/var/lib/gromox/domain/")
            .with_private(false)
            .with_wstring_encoding(WStringEncoding::Utf16)
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.addr(), "mail.example.com:5001");
        assert_eq!(config.prefix.as_deref(), Some("/var/lib/gromox/domain/"));
        assert_eq!(config.private, Some(false));
        assert_eq!(config.wstring_encoding(), WStringEncoding::Utf16);
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_sub_second_timeouts_round_up() {
        let config = ClientConfig::default()
            .with_connect_timeout(Duration::from_millis(500))
            .with_request_timeout(Duration::from_millis(1500));
        assert_eq!(config.connect_timeout(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());

        let config = ClientConfig::default().with_request_timeout(Duration::ZERO);
        assert_eq!(config.request_timeout_secs, 1);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host: 10.0.0.2\nport: 5001\nprefix: /d-data/\nprivate: true").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 5001);
        assert_eq!(config.prefix.as_deref(), Some("/d-data/"));
        assert_eq!(config.private, Some(true));
        // Unset keys keep their defaults
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: not-a-number").unwrap();
        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("EXMDB_HOST", "db.internal"),
            ("EXMDB_PORT", "6000"),
            ("EXMDB_PREFIX", "/u-data/"),
            ("EXMDB_PRIVATE", "TRUE"),
            ("EXMDB_WSTRING_UTF16", "1"),
            ("EXMDB_CONNECT_TIMEOUT", "3"),
            ("EXMDB_REQUEST_TIMEOUT", "garbage"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.addr(), "db.internal:6000");
        assert_eq!(config.prefix.as_deref(), Some("/u-data/"));
        assert_eq!(config.private, Some(true));
        assert!(config.wstring_utf16);
        assert_eq!(config.connect_timeout_secs, 3);
        // Unparseable values are ignored
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_validate() {
        let config = ClientConfig {
            port: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue("port", _))
        ));

        let config = ClientConfig {
            request_timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ClientConfig::default().with_prefix("/d-data/");
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
