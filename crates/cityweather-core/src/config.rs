use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Default location of the credentials file, relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = "config/credentials.json";

/// Visual Crossing timeline endpoint.
pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// MySQL connection parameters, as stored under the `mysql` key.
#[derive(Clone, Deserialize)]
pub struct MySqlConfig {
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub host: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
    pub database: String,
}

impl MySqlConfig {
    /// `user@host:port/database`, safe to log.
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for MySqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

/// Local SQLite database, as stored under the `sqlite` key.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
    pub path: PathBuf,
}

/// Where normalized observations are written.
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    MySql(MySqlConfig),
    Sqlite(SqliteConfig),
}

/// On-disk shape of the credentials file. Every key is optional here so that
/// a missing key is reported by name instead of as a serde error.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    api_key: Option<String>,
    mysql: Option<MySqlConfig>,
    sqlite: Option<SqliteConfig>,
    base_url: Option<String>,
}

/// API key and database parameters, loaded once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub database: DatabaseConfig,
    pub base_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("database", &self.database)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Credentials {
    /// Load and validate the credentials file.
    ///
    /// Validation warnings are logged; errors abort with `ConfigError::Invalid`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let credentials = Self::from_json(&contents)?;
        let validation = credentials.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        tracing::debug!(path = %path.display(), "Loaded credentials");
        Ok(credentials)
    }

    /// Parse credentials from JSON text without validating values.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let file: CredentialsFile =
            serde_json::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let api_key = file
            .api_key
            .ok_or_else(|| ConfigError::MissingSetting("api_key".to_string()))?;

        let database = match (file.mysql, file.sqlite) {
            (Some(mysql), None) => DatabaseConfig::MySql(mysql),
            (None, Some(sqlite)) => DatabaseConfig::Sqlite(sqlite),
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(
                    "only one of 'mysql' or 'sqlite' may be configured".to_string(),
                ))
            }
            (None, None) => return Err(ConfigError::MissingSetting("mysql".to_string())),
        };

        Ok(Self {
            api_key,
            database,
            base_url: file.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Validate the loaded values.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.api_key.trim().is_empty() {
            result.add_error("api_key", "API key must not be empty");
        }

        match &self.database {
            DatabaseConfig::MySql(mysql) => {
                if mysql.host.trim().is_empty() {
                    result.add_error("mysql.host", "Host must not be empty");
                }
                if mysql.user.trim().is_empty() {
                    result.add_error("mysql.user", "User must not be empty");
                }
                if mysql.database.trim().is_empty() {
                    result.add_error("mysql.database", "Database name must not be empty");
                }
                if mysql.port == 0 {
                    result.add_error("mysql.port", "Port cannot be 0");
                }
                if mysql.password.is_empty() {
                    result.add_warning("mysql.password", "Connecting without a password");
                }
            }
            DatabaseConfig::Sqlite(sqlite) => {
                if sqlite.path.as_os_str().is_empty() {
                    result.add_error("sqlite.path", "Path must not be empty");
                }
            }
        }

        self.validate_url(&mut result);
        result
    }

    fn validate_url(&self, result: &mut ValidationResult) {
        match Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        "base_url",
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error("base_url", "URL must have a host");
                }
            }
            Err(e) => result.add_error("base_url", format!("Invalid URL: {}", e)),
        }
    }
}

/// MySQL ports show up both as `3306` and `"3306"` in hand-written files.
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MYSQL_JSON: &str = r#"{
        "api_key": "ABC123",
        "mysql": {
            "user": "root",
            "password": "root",
            "host": "localhost",
            "port": 3306,
            "database": "weather_project"
        }
    }"#;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_mysql_credentials() {
        let file = write_temp(MYSQL_JSON);
        let creds = Credentials::load(file.path()).unwrap();

        assert_eq!(creds.api_key, "ABC123");
        assert_eq!(creds.base_url, DEFAULT_BASE_URL);
        match creds.database {
            DatabaseConfig::MySql(mysql) => {
                assert_eq!(mysql.port, 3306);
                assert_eq!(mysql.target(), "root@localhost:3306/weather_project");
            }
            other => panic!("expected mysql, got {other:?}"),
        }
    }

    #[test]
    fn test_port_as_string() {
        let json = MYSQL_JSON.replace("3306", "\"3307\"");
        let creds = Credentials::from_json(&json).unwrap();
        match creds.database {
            DatabaseConfig::MySql(mysql) => assert_eq!(mysql.port, 3307),
            other => panic!("expected mysql, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_missing_api_key() {
        let err = Credentials::from_json(r#"{"sqlite": {"path": "w.db"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting(ref key) if key == "api_key"));
    }

    #[test]
    fn test_missing_storage_block() {
        let err = Credentials::from_json(r#"{"api_key": "k"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting(ref key) if key == "mysql"));
    }

    #[test]
    fn test_both_storage_blocks_rejected() {
        let json = r#"{
            "api_key": "k",
            "sqlite": {"path": "w.db"},
            "mysql": {"user": "u", "host": "h", "port": 1, "database": "d"}
        }"#;
        let err = Credentials::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = Credentials::from_json("{ api_key: ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_empty_api_key_fails_validation() {
        let file = write_temp(r#"{"api_key": "  ", "sqlite": {"path": "w.db"}}"#);
        let err = Credentials::load(file.path()).unwrap_err();
        match err {
            ConfigError::Invalid(summary) => assert!(summary.contains("api_key")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_password_is_only_a_warning() {
        let json = MYSQL_JSON.replace("\"password\": \"root\",", "");
        let creds = Credentials::from_json(&json).unwrap();
        let result = creds.validate();

        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "mysql.password");
    }

    #[test]
    fn test_invalid_base_url() {
        let json = r#"{"api_key": "k", "sqlite": {"path": "w.db"}, "base_url": "ftp://x"}"#;
        let creds = Credentials::from_json(json).unwrap();
        let result = creds.validate();

        assert!(!result.is_valid());
        assert!(result.error_summary().contains("base_url"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::from_json(MYSQL_JSON).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("ABC123"));
        assert!(debug.contains("password: \"<redacted>\""));
    }
}
